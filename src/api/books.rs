//! Book endpoints
//!
//! Listing supports a genre filter with pagination; search is a separate
//! unpaginated free-text operation. Create and update verify the
//! referenced author exists before persisting.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;

use super::JsonBody;
use super::dto::{BookDetailResponse, author_to_summary, book_to_response};
use super::pagination::{Paginated, Pagination};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Book, EntityId};
use crate::error::AppError;
use crate::validate::{BookPayload, Mode, validate_book};

const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Deserialize)]
pub struct ListBooksParams {
    page: Option<String>,
    limit: Option<String>,
    genre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

fn checked_id(raw: &str) -> Result<&str, AppError> {
    if EntityId::is_valid(raw) {
        Ok(raw)
    } else {
        Err(AppError::InvalidId)
    }
}

/// Reject a write whose authorId points at no existing author.
async fn ensure_author_exists(state: &AppState, author_id: &str) -> Result<(), AppError> {
    if state.db.author_exists(author_id).await? {
        Ok(())
    } else {
        Err(AppError::Validation(vec![
            "authorId does not reference an existing author".to_string(),
        ]))
    }
}

/// GET /books
///
/// Paginated listing sorted by title, with an optional case-insensitive
/// genre filter. Total count uses the same predicate as the page.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListBooksParams>,
) -> Result<Json<Paginated<super::dto::BookResponse>>, AppError> {
    let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref())?;
    let genre = params
        .genre
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    let total = state.db.count_books(genre).await?;
    let books = state
        .db
        .list_books(genre, pagination.skip(), pagination.limit)
        .await?;

    let data = books.iter().map(book_to_response).collect();
    Ok(Json(Paginated::new(pagination, total, data)))
}

/// GET /books/search?q=
///
/// Free-text search against title, genre, or tags. The query is
/// required; results are unpaginated.
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            AppError::Validation(vec!["Search query parameter q is required".to_string()])
        })?;

    let books = state.db.search_books(query).await?;
    let data: Vec<_> = books.iter().map(book_to_response).collect();

    Ok(Json(serde_json::json!({
        "query": query,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /books/:id
///
/// Book detail enriched with its author's summary fields.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDetailResponse>, AppError> {
    let id = checked_id(&id)?;
    let book = state
        .db
        .get_book(id)
        .await?
        .ok_or(AppError::NotFound("Book"))?;

    let author = state.db.get_author(&book.author_id).await?;

    Ok(Json(BookDetailResponse {
        book: book_to_response(&book),
        author: author.as_ref().map(author_to_summary),
    }))
}

/// POST /books (session)
pub async fn create_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<(StatusCode, Json<super::dto::BookResponse>), AppError> {
    let violations = validate_book(&payload, Mode::Create);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let author_id = payload
        .author_id
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    ensure_author_exists(&state, &author_id).await?;

    let now = Utc::now();
    let book = Book {
        id: EntityId::new().0,
        title: payload.title.as_deref().unwrap_or_default().trim().to_string(),
        author_id,
        genre: payload.genre.as_deref().unwrap_or_default().trim().to_string(),
        published_year: payload.published_year,
        pages: payload.pages,
        price: payload.price.unwrap_or_default(),
        in_stock: payload.in_stock.unwrap_or(true),
        tags: SqlJson(payload.tags.unwrap_or_default()),
        summary: payload.summary.unwrap_or_default(),
        isbn: payload.isbn.map(|isbn| isbn.trim().to_string()),
        language: payload
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        created_at: now,
        updated_at: now,
    };

    state.db.insert_book(&book).await?;
    tracing::info!(book_id = %book.id, user = %user.username, "Book created");

    Ok((StatusCode::CREATED, Json(book_to_response(&book))))
}

/// PUT /books/:id (session)
///
/// Partial update. A submitted authorId is re-checked against the
/// authors table before persisting.
pub async fn update_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BookPayload>,
) -> Result<Json<super::dto::BookResponse>, AppError> {
    let id = checked_id(&id)?;
    let mut book = state
        .db
        .get_book(id)
        .await?
        .ok_or(AppError::NotFound("Book"))?;

    let violations = validate_book(&payload, Mode::Update);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    if let Some(author_id) = payload.author_id.as_deref().map(str::trim) {
        if author_id != book.author_id {
            ensure_author_exists(&state, author_id).await?;
        }
        book.author_id = author_id.to_string();
    }
    if let Some(title) = payload.title {
        book.title = title.trim().to_string();
    }
    if let Some(genre) = payload.genre {
        book.genre = genre.trim().to_string();
    }
    if let Some(year) = payload.published_year {
        book.published_year = Some(year);
    }
    if let Some(pages) = payload.pages {
        book.pages = Some(pages);
    }
    if let Some(price) = payload.price {
        book.price = price;
    }
    if let Some(in_stock) = payload.in_stock {
        book.in_stock = in_stock;
    }
    if let Some(tags) = payload.tags {
        book.tags = SqlJson(tags);
    }
    if let Some(summary) = payload.summary {
        book.summary = summary;
    }
    if let Some(isbn) = payload.isbn {
        book.isbn = Some(isbn.trim().to_string());
    }
    if let Some(language) = payload.language {
        book.language = language.trim().to_string();
    }
    book.updated_at = Utc::now();

    state.db.update_book(&book).await?;
    tracing::info!(book_id = %book.id, user = %user.username, "Book updated");

    Ok(Json(book_to_response(&book)))
}

/// DELETE /books/:id (session)
pub async fn delete_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = checked_id(&id)?;
    let removed = state.db.delete_book(id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Book"));
    }

    tracing::info!(book_id = %id, user = %user.username, "Book deleted");

    Ok(Json(serde_json::json!({ "message": "Book deleted" })))
}
