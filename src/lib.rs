//! Bookshelf - a Books & Authors catalog REST API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Author/Book CRUD, listing, search                        │
//! │  - Auth endpoints (GitHub OAuth, session)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Validation / Controllers                    │
//! │  - Field rules, pagination, cross-entity checks             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for authors and books
//! - `auth`: GitHub OAuth, sessions, auth middleware
//! - `validate`: pure field validation
//! - `data`: database and entity models
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod validate;

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::auth::MaybeUser;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources: configuration, database pool, HTTP client.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// HTTP client for the GitHub OAuth handshake
    pub http_client: Arc<reqwest::Client>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Initialize HTTP client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        error::set_expose_internal_errors(!config.server.is_production());

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Bookshelf/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            http_client: Arc::new(http_client),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config);

    Router::new()
        .route("/", axum::routing::get(welcome))
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router(state.clone()))
        .nest("/authors", api::authors_router(state.clone()))
        .nest("/books", api::books_router(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(config: &config::AppConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::CorsLayer;

    if !config.server.is_production() {
        return CorsLayer::permissive();
    }

    let allowed_origin = config.server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from public URL; denying cross-origin requests"
            );
            CorsLayer::new()
        }
    }
}

/// GET /
///
/// Welcome payload; greets the authenticated user when a session is
/// present and points at the login entry otherwise.
async fn welcome(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Json<serde_json::Value> {
    let environment = &state.config.server.environment;

    match user {
        Some(user) => Json(serde_json::json!({
            "message": format!(
                "Welcome {}!",
                user.display_name.as_deref().unwrap_or(&user.username)
            ),
            "user": api::user_to_response(&user),
            "logoutUrl": "/auth/logout",
            "environment": environment,
        })),
        None => Json(serde_json::json!({
            "message": "Welcome to the Books & Authors API!",
            "loginUrl": error::LOGIN_URL,
            "environment": environment,
        })),
    }
}

async fn health_check() -> &'static str {
    "OK"
}
