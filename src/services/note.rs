use crate::db::Database;
use crate::enrichment::EnrichmentResult;
use crate::error::{AppError, AppResult};
use crate::models::note::{Note, NoteForm};
use crate::utils::time::current_timestamp_seconds;
use uuid::Uuid;

const NOTE_COLUMNS: &str = r#"
    id, owner_id, title, content, ai_summary, is_pinned, is_archived,
    created_at, updated_at,
    CAST(tags AS TEXT) as tags_str,
    CAST(ai_tags AS TEXT) as ai_tags_str
"#;

pub struct NoteService<'a> {
    db: &'a Database,
}

impl<'a> NoteService<'a> {
    pub fn new(db: &'a Database) -> Self {
        NoteService { db }
    }

    pub async fn insert_new_note(
        &self,
        owner_id: &str,
        form_data: &NoteForm,
        enrichment: Option<&EnrichmentResult>,
    ) -> AppResult<Note> {
        let now = current_timestamp_seconds();
        let id = Uuid::new_v4().to_string();

        let tags_json = form_data
            .tags
            .as_ref()
            .and_then(|t| serde_json::to_string(t).ok());

        let ai_summary = enrichment.and_then(|e| e.summary.clone());
        let ai_tags_json = enrichment
            .and_then(|e| e.tags.as_ref())
            .and_then(|t| serde_json::to_string(t).ok());

        sqlx::query(
            r#"
            INSERT INTO notes (id, owner_id, title, content, tags, ai_summary, ai_tags,
                               is_pinned, is_archived, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&form_data.title)
        .bind(&form_data.content)
        .bind(&tags_json)
        .bind(&ai_summary)
        .bind(&ai_tags_json)
        .bind(form_data.is_pinned)
        .bind(form_data.is_archived)
        .bind(now)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_note_by_id(owner_id, &id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create note".to_string()))
    }

    /// Lookups are always scoped to the owner: someone else's note id is
    /// indistinguishable from a missing one.
    pub async fn get_note_by_id(&self, owner_id: &str, id: &str) -> AppResult<Option<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE id = $1 AND owner_id = $2",
            NOTE_COLUMNS
        );

        let result = sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db.pool)
            .await?;

        Ok(result)
    }

    pub async fn list_notes(
        &self,
        owner_id: &str,
        search: Option<&str>,
        include_archived: bool,
    ) -> AppResult<Vec<Note>> {
        let mut sql = format!("SELECT {} FROM notes WHERE owner_id = $1", NOTE_COLUMNS);

        if !include_archived {
            sql.push_str(" AND is_archived = 0");
        }
        if search.is_some() {
            sql.push_str(" AND (LOWER(title) LIKE $2 OR LOWER(content) LIKE $2)");
        }
        sql.push_str(" ORDER BY is_pinned DESC, updated_at DESC");

        let mut query = sqlx::query_as::<_, Note>(&sql).bind(owner_id);
        if let Some(search) = search {
            query = query.bind(format!("%{}%", search.to_lowercase()));
        }

        let notes = query.fetch_all(&self.db.pool).await?;
        Ok(notes)
    }

    /// Writes back a note previously loaded through this service, refreshing
    /// its updated_at stamp.
    pub async fn update_note(&self, note: &Note) -> AppResult<Note> {
        let now = current_timestamp_seconds();

        let tags_json = note
            .tags
            .as_ref()
            .and_then(|t| serde_json::to_string(t).ok());
        let ai_tags_json = note
            .ai_tags
            .as_ref()
            .and_then(|t| serde_json::to_string(t).ok());

        sqlx::query(
            r#"
            UPDATE notes
            SET title = $1, content = $2, tags = $3, ai_summary = $4, ai_tags = $5,
                is_pinned = $6, is_archived = $7, updated_at = $8
            WHERE id = $9 AND owner_id = $10
            "#,
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(&tags_json)
        .bind(&note.ai_summary)
        .bind(&ai_tags_json)
        .bind(note.is_pinned)
        .bind(note.is_archived)
        .bind(now)
        .bind(&note.id)
        .bind(&note.owner_id)
        .execute(&self.db.pool)
        .await?;

        self.get_note_by_id(&note.owner_id, &note.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))
    }

    pub async fn delete_note_by_id(&self, owner_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::UserService;

    async fn setup() -> (Database, String) {
        let db = Database::new_in_memory().await.unwrap();
        let user = UserService::new(&db)
            .insert_new_user("alice@example.com", "alice", "hash", None)
            .await
            .unwrap();
        (db, user.id)
    }

    fn note_form(title: &str, content: &str) -> NoteForm {
        NoteForm {
            title: title.to_string(),
            content: content.to_string(),
            tags: None,
            is_pinned: false,
            is_archived: false,
            use_ai: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        let mut form = note_form("Groceries", "Milk and eggs");
        form.tags = Some(vec!["shopping".to_string()]);

        let enrichment = EnrichmentResult {
            summary: Some("Groceries Milk and eggs".to_string()),
            tags: Some(vec!["shopping".to_string()]),
        };

        let note = service
            .insert_new_note(&owner, &form, Some(&enrichment))
            .await
            .unwrap();

        let mut fetched = service
            .get_note_by_id(&owner, &note.id)
            .await
            .unwrap()
            .unwrap();
        fetched.parse_json_fields();

        assert_eq!(fetched.title, "Groceries");
        assert_eq!(fetched.tags, Some(vec!["shopping".to_string()]));
        assert_eq!(
            fetched.ai_summary.as_deref(),
            Some("Groceries Milk and eggs")
        );
        assert_eq!(fetched.ai_tags, Some(vec!["shopping".to_string()]));
    }

    #[tokio::test]
    async fn test_other_owner_sees_nothing() {
        let (db, owner) = setup().await;
        let other = UserService::new(&db)
            .insert_new_user("bob@example.com", "bob", "hash", None)
            .await
            .unwrap();

        let service = NoteService::new(&db);
        let note = service
            .insert_new_note(&owner, &note_form("Private", "Secret"), None)
            .await
            .unwrap();

        assert!(service
            .get_note_by_id(&other.id, &note.id)
            .await
            .unwrap()
            .is_none());
        assert!(!service.delete_note_by_id(&other.id, &note.id).await.unwrap());
        assert!(service.list_notes(&other.id, None, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_pinned_then_recent() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        let old = service
            .insert_new_note(&owner, &note_form("Old", "c"), None)
            .await
            .unwrap();
        let new = service
            .insert_new_note(&owner, &note_form("New", "c"), None)
            .await
            .unwrap();
        let mut pinned_form = note_form("Pinned", "c");
        pinned_form.is_pinned = true;
        let pinned = service
            .insert_new_note(&owner, &pinned_form, None)
            .await
            .unwrap();

        // Force distinct update stamps; inserts above may share a second
        for (id, stamp) in [(&old.id, 100), (&pinned.id, 150), (&new.id, 200)] {
            sqlx::query("UPDATE notes SET updated_at = $1 WHERE id = $2")
                .bind(stamp)
                .bind(id)
                .execute(&db.pool)
                .await
                .unwrap();
        }

        let titles: Vec<String> = service
            .list_notes(&owner, None, false)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();

        assert_eq!(titles, vec!["Pinned", "New", "Old"]);
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        service
            .insert_new_note(&owner, &note_form("Rust notes", "Borrow checker"), None)
            .await
            .unwrap();
        service
            .insert_new_note(&owner, &note_form("Dinner", "Pasta recipe"), None)
            .await
            .unwrap();

        let hits = service
            .list_notes(&owner, Some("BORROW"), false)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust notes");

        let misses = service
            .list_notes(&owner, Some("tensorflow"), false)
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_list_excludes_archived_by_default() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        let mut archived_form = note_form("Archived", "c");
        archived_form.is_archived = true;
        service
            .insert_new_note(&owner, &archived_form, None)
            .await
            .unwrap();
        service
            .insert_new_note(&owner, &note_form("Visible", "c"), None)
            .await
            .unwrap();

        let default_list = service.list_notes(&owner, None, false).await.unwrap();
        assert_eq!(default_list.len(), 1);
        assert_eq!(default_list[0].title, "Visible");

        let full_list = service.list_notes(&owner, None, true).await.unwrap();
        assert_eq!(full_list.len(), 2);
    }

    #[tokio::test]
    async fn test_update_note_persists_policy_result() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        let mut note = service
            .insert_new_note(&owner, &note_form("Title", "Content"), None)
            .await
            .unwrap();
        note.parse_json_fields();

        note.content = "Revised content".to_string();
        note.set_enrichment(EnrichmentResult {
            summary: Some("Title Revised content".to_string()),
            tags: Some(vec!["revised".to_string()]),
        });

        let mut updated = service.update_note(&note).await.unwrap();
        updated.parse_json_fields();

        assert_eq!(updated.content, "Revised content");
        assert_eq!(updated.ai_summary.as_deref(), Some("Title Revised content"));
        assert_eq!(updated.ai_tags, Some(vec!["revised".to_string()]));
    }

    #[tokio::test]
    async fn test_deleting_owner_cascades_to_notes() {
        let (db, owner) = setup().await;
        let service = NoteService::new(&db);

        let note = service
            .insert_new_note(&owner, &note_form("Doomed", "c"), None)
            .await
            .unwrap();

        assert!(UserService::new(&db).delete_user_by_id(&owner).await.unwrap());

        let orphan = sqlx::query("SELECT id FROM notes WHERE id = $1")
            .bind(&note.id)
            .fetch_optional(&db.pool)
            .await
            .unwrap();
        assert!(orphan.is_none());
    }
}
