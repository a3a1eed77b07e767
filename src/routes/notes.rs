use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::note::{NoteForm, NoteModel, NoteUpdateForm};
use crate::services::NoteService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    )
    .service(
        web::resource("/{id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_note))
            .route(web::put().to(update_note))
            .route(web::delete().to(delete_note)),
    );
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    search: Option<String>,
    #[serde(default)]
    include_archived: bool,
}

/// GET / - Notes owned by the current user, pinned first, newest first
async fn list_notes(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let note_service = NoteService::new(&state.db);
    let notes = note_service
        .list_notes(
            &auth_user.user.id,
            query.search.as_deref(),
            query.include_archived,
        )
        .await?;

    let models: Vec<NoteModel> = notes.into_iter().map(NoteModel::from).collect();
    Ok(HttpResponse::Ok().json(models))
}

/// POST / - Create a note, optionally enriched with an AI summary and tags
async fn create_note(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    form_data: web::Json<NoteForm>,
) -> AppResult<HttpResponse> {
    // Invalid input is rejected before enrichment is ever attempted
    form_data
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let enrichment = if form_data.use_ai {
        Some(
            state
                .enrichment
                .enrich(
                    &form_data.title,
                    &form_data.content,
                    form_data.tags.as_deref(),
                )
                .await,
        )
    } else {
        None
    };

    let note_service = NoteService::new(&state.db);
    let note = note_service
        .insert_new_note(&auth_user.user.id, &form_data, enrichment.as_ref())
        .await?;

    Ok(HttpResponse::Created().json(NoteModel::from(note)))
}

/// GET /{id} - Fetch a single note
async fn get_note(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let note_id = path.into_inner();

    let note_service = NoteService::new(&state.db);
    let note = note_service
        .get_note_by_id(&auth_user.user.id, &note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

    Ok(HttpResponse::Ok().json(NoteModel::from(note)))
}

/// PUT /{id} - Apply a partial update; enrichment re-runs when the content
/// changed or the caller forced regeneration
async fn update_note(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    form_data: web::Json<NoteUpdateForm>,
) -> AppResult<HttpResponse> {
    let note_id = path.into_inner();

    form_data
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let note_service = NoteService::new(&state.db);
    let mut note = note_service
        .get_note_by_id(&auth_user.user.id, &note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;
    note.parse_json_fields();

    if note.apply_update(&form_data) {
        // Enrichment sees the note as just mutated, manual tags included
        let result = state
            .enrichment
            .enrich(&note.title, &note.content, note.tags.as_deref())
            .await;
        note.set_enrichment(result);
    }

    let updated = note_service.update_note(&note).await?;
    Ok(HttpResponse::Ok().json(NoteModel::from(updated)))
}

/// DELETE /{id} - Delete a note owned by the user
async fn delete_note(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let note_id = path.into_inner();

    let note_service = NoteService::new(&state.db);
    let deleted = note_service
        .delete_note_by_id(&auth_user.user.id, &note_id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Note not found".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}
