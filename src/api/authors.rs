//! Author endpoints
//!
//! Reads are public; writes sit behind the session gate (layered in
//! [`super::authors_router`]). Controllers validate, run cross-entity
//! checks, and maintain timestamps explicitly before persisting.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;

use super::JsonBody;
use super::dto::{author_to_response, book_to_summary};
use super::pagination::{Paginated, Pagination};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Author, EntityId};
use crate::error::AppError;
use crate::validate::{AuthorPayload, Mode, validate_author};

#[derive(Debug, Deserialize)]
pub struct ListAuthorsParams {
    page: Option<String>,
    limit: Option<String>,
}

fn checked_id(raw: &str) -> Result<&str, AppError> {
    if EntityId::is_valid(raw) {
        Ok(raw)
    } else {
        Err(AppError::InvalidId)
    }
}

/// GET /authors
///
/// Paginated author listing.
pub async fn list_authors(
    State(state): State<AppState>,
    Query(params): Query<ListAuthorsParams>,
) -> Result<Json<Paginated<super::dto::AuthorResponse>>, AppError> {
    let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref())?;

    let total = state.db.count_authors().await?;
    let authors = state
        .db
        .list_authors(pagination.skip(), pagination.limit)
        .await?;

    let data = authors.iter().map(author_to_response).collect();
    Ok(Json(Paginated::new(pagination, total, data)))
}

/// GET /authors/:id
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<super::dto::AuthorResponse>, AppError> {
    let id = checked_id(&id)?;
    let author = state
        .db
        .get_author(id)
        .await?
        .ok_or(AppError::NotFound("Author"))?;

    Ok(Json(author_to_response(&author)))
}

/// GET /authors/:id/books
///
/// The author plus all books referencing it, projected to summaries.
pub async fn get_author_books(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = checked_id(&id)?;
    let author = state
        .db
        .get_author(id)
        .await?
        .ok_or(AppError::NotFound("Author"))?;

    let books = state.db.list_books_by_author(id).await?;
    let books: Vec<_> = books.iter().map(book_to_summary).collect();

    Ok(Json(serde_json::json!({
        "author": author_to_response(&author),
        "count": books.len(),
        "books": books,
    })))
}

/// POST /authors (session)
pub async fn create_author(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<AuthorPayload>,
) -> Result<(StatusCode, Json<super::dto::AuthorResponse>), AppError> {
    let violations = validate_author(&payload, Mode::Create);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let now = Utc::now();
    let author = Author {
        id: EntityId::new().0,
        name: payload.name.as_deref().unwrap_or_default().trim().to_string(),
        bio: payload.bio.unwrap_or_default(),
        birth_date: payload.birth_date,
        nationality: payload
            .nationality
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
        website: payload.website.map(|w| w.trim().to_string()),
        genres: SqlJson(payload.genres.unwrap_or_default()),
        created_at: now,
        updated_at: now,
    };

    state.db.insert_author(&author).await?;
    tracing::info!(author_id = %author.id, user = %user.username, "Author created");

    Ok((StatusCode::CREATED, Json(author_to_response(&author))))
}

/// PUT /authors/:id (session)
///
/// Partial update: only submitted fields change. `updated_at` always
/// reflects this write.
pub async fn update_author(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<AuthorPayload>,
) -> Result<Json<super::dto::AuthorResponse>, AppError> {
    let id = checked_id(&id)?;
    let mut author = state
        .db
        .get_author(id)
        .await?
        .ok_or(AppError::NotFound("Author"))?;

    let violations = validate_author(&payload, Mode::Update);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    if let Some(name) = payload.name {
        author.name = name.trim().to_string();
    }
    if let Some(bio) = payload.bio {
        author.bio = bio;
    }
    if let Some(birth_date) = payload.birth_date {
        author.birth_date = Some(birth_date);
    }
    if let Some(nationality) = payload.nationality {
        author.nationality = nationality.trim().to_string();
    }
    if let Some(website) = payload.website {
        author.website = Some(website.trim().to_string());
    }
    if let Some(genres) = payload.genres {
        author.genres = SqlJson(genres);
    }
    author.updated_at = Utc::now();

    state.db.update_author(&author).await?;
    tracing::info!(author_id = %author.id, user = %user.username, "Author updated");

    Ok(Json(author_to_response(&author)))
}

/// DELETE /authors/:id (session)
///
/// Refused while any book still references the author; the refusal
/// reports the dependent count.
pub async fn delete_author(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = checked_id(&id)?;
    if state.db.get_author(id).await?.is_none() {
        return Err(AppError::NotFound("Author"));
    }

    let dependents = state.db.count_books_by_author(id).await?;
    if dependents > 0 {
        return Err(AppError::DependencyBlocked { dependents });
    }

    state.db.delete_author(id).await?;
    tracing::info!(author_id = %id, user = %user.username, "Author deleted");

    Ok(Json(serde_json::json!({ "message": "Author deleted" })))
}
