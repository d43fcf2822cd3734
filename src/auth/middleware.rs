//! Authentication middleware
//!
//! Gates write endpoints behind an authenticated session. Unauthenticated
//! API-style requests get a 401 with a login hint; browser navigation
//! requests are redirected to the login entry point instead.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::session::verify_session_token;
use crate::AppState;
use crate::data::User;
use crate::error::{AppError, LOGIN_URL};

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get("session").map(|cookie| cookie.value().to_owned())
        })
}

/// Resolve the full User record behind a request's session token.
///
/// The token only carries the user ID; a valid signature with a since-
/// deleted user is still Unauthorized.
async fn authenticate_request(headers: &HeaderMap, state: &AppState) -> Result<User, AppError> {
    let token = extract_token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    let session = verify_session_token(&token, &state.config.auth.session_secret)?;

    state
        .db
        .get_user(&session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Whether an unauthenticated request should be redirected to login
/// rather than answered with JSON.
///
/// Browser navigation sends `Accept: text/html`; API clients either omit
/// it or ask for JSON.
pub fn wants_login_redirect(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get("Accept").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    accept.contains("text/html") && !accept.contains("application/json")
}

/// Middleware to require authentication
///
/// Verifies the session, loads the User, and adds it to request
/// extensions for the [`CurrentUser`] extractor.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/authors", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate_request(request.headers(), &state).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(err) => {
            if wants_login_redirect(request.headers()) {
                return Ok(Redirect::to(LOGIN_URL).into_response());
            }
            Err(err)
        }
    }
}

/// Middleware to require an authenticated admin
///
/// Same as [`require_auth`] plus a role check; non-admins get 403.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_request(request.headers(), &state).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for current authenticated user
///
/// Use in handlers behind [`require_auth`] to get the resolved User.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let user = authenticate_request(&parts.headers, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Optional current user extractor
///
/// Never blocks; annotates the request with `Some(User)` when a valid
/// session is present, `None` otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let state = AppState::from_ref(state);
        let user = authenticate_request(&parts.headers, &state).await.ok();

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
