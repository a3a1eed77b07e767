use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::services::user::UserService;
use crate::utils::security::verify_password;

pub struct AuthService<'a> {
    db: &'a Database,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database) -> Self {
        AuthService { db }
    }

    /// Verifies credentials against the stored hash. Returns the user on
    /// success, None on a bad username or password; inactive accounts are
    /// rejected outright.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let user_service = UserService::new(self.db);
        let user = match user_service.get_user_by_username(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if !verify_password(password, &user.hashed_password)? {
            return Ok(None);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Inactive user account".to_string()));
        }

        Ok(Some(user))
    }
}
