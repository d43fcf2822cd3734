//! API layer
//!
//! HTTP handlers for the catalog:
//! - Author CRUD and sub-resources
//! - Book CRUD, listing filters, and search
//!
//! Reads are public; writes are layered behind the session gate here so
//! route composition stays in one place.

use axum::{
    Router,
    extract::FromRequest,
    middleware,
    routing::{delete, get, post, put},
};

pub mod authors;
pub mod books;
pub mod dto;
pub mod pagination;

pub use dto::*;
pub use pagination::{Paginated, Pagination};

use crate::AppState;
use crate::auth::require_auth;
use crate::error::AppError;

/// JSON body extractor whose rejection is rendered through [`AppError`],
/// so a malformed body answers with the standard JSON error shape
/// instead of axum's plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Create the /authors router
pub fn authors_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(authors::list_authors))
        .route("/:id", get(authors::get_author))
        .route("/:id/books", get(authors::get_author_books));

    let protected = Router::new()
        .route("/", post(authors::create_author))
        .route("/:id", put(authors::update_author))
        .route("/:id", delete(authors::delete_author))
        .layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

/// Create the /books router
pub fn books_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(books::list_books))
        // Static route must sit beside the :id route; axum prefers it
        .route("/search", get(books::search_books))
        .route("/:id", get(books::get_book));

    let protected = Router::new()
        .route("/", post(books::create_book))
        .route("/:id", put(books::update_book))
        .route("/:id", delete(books::delete_book))
        .layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}
