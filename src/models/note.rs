use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::enrichment::EnrichmentResult;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    #[sqlx(skip)]
    pub tags: Option<Vec<String>>,
    #[sqlx(default)]
    #[serde(skip)]
    pub tags_str: Option<String>,
    pub ai_summary: Option<String>,
    #[sqlx(skip)]
    pub ai_tags: Option<Vec<String>>,
    #[sqlx(default)]
    #[serde(skip)]
    pub ai_tags_str: Option<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    pub fn parse_json_fields(&mut self) {
        if let Some(ref tags_str) = self.tags_str {
            self.tags = serde_json::from_str(tags_str).ok();
        }
        if let Some(ref ai_tags_str) = self.ai_tags_str {
            self.ai_tags = serde_json::from_str(ai_tags_str).ok();
        }
    }

    /// Applies a partial update in place and decides whether AI enrichment
    /// must re-run. Title/content only count as changed when the incoming
    /// value differs by exact string equality. Manual tags are replaced
    /// outright whenever present, empty list included. Returns true when
    /// the title or content changed or the caller forced regeneration.
    pub fn apply_update(&mut self, form: &NoteUpdateForm) -> bool {
        let mut content_changed = false;

        if let Some(ref title) = form.title {
            if *title != self.title {
                self.title = title.clone();
                content_changed = true;
            }
        }

        if let Some(ref content) = form.content {
            if *content != self.content {
                self.content = content.clone();
                content_changed = true;
            }
        }

        if let Some(ref tags) = form.tags {
            self.tags = Some(tags.clone());
        }

        if let Some(pinned) = form.is_pinned {
            self.is_pinned = pinned;
        }

        if let Some(archived) = form.is_archived {
            self.is_archived = archived;
        }

        content_changed || form.regenerate_ai
    }

    /// Replaces both AI fields from one enrichment run. They are only ever
    /// written together.
    pub fn set_enrichment(&mut self, result: EnrichmentResult) {
        self.ai_summary = result.summary;
        self.ai_tags = result.tags;
    }
}

fn default_use_ai() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,

    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub is_pinned: bool,

    #[serde(default)]
    pub is_archived: bool,

    /// Gates enrichment at creation time; defaults to on.
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteUpdateForm {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    pub tags: Option<Vec<String>>,

    pub is_pinned: Option<bool>,

    pub is_archived: Option<bool>,

    /// Forces re-enrichment even when title/content are unchanged.
    #[serde(default)]
    pub regenerate_ai: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteModel {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub ai_summary: Option<String>,
    pub ai_tags: Option<Vec<String>>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Note> for NoteModel {
    fn from(mut note: Note) -> Self {
        note.parse_json_fields();
        NoteModel {
            id: note.id,
            owner_id: note.owner_id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            ai_summary: note.ai_summary,
            ai_tags: note.ai_tags,
            is_pinned: note.is_pinned,
            is_archived: note.is_archived,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}
