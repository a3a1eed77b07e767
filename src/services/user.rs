use crate::db::Database;
use crate::error::AppResult;
use crate::models::User;
use crate::utils::time::current_timestamp_seconds;
use uuid::Uuid;

pub struct UserService<'a> {
    db: &'a Database,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database) -> Self {
        UserService { db }
    }

    pub async fn insert_new_user(
        &self,
        email: &str,
        username: &str,
        hashed_password: &str,
        full_name: Option<&str>,
    ) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = current_timestamp_seconds();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, hashed_password, full_name,
                               is_active, is_superuser, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(hashed_password)
        .bind(full_name)
        .bind(true)
        .bind(false)
        .bind(now)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_user_by_id(&id).await?.ok_or_else(|| {
            crate::error::AppError::InternalServerError("Failed to create user".to_string())
        })
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, hashed_password, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, hashed_password, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, hashed_password, full_name,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(result)
    }

    #[allow(dead_code)]
    pub async fn delete_user_by_id(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
