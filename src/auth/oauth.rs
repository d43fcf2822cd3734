//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub and the
//! local identity resolution that maps a GitHub profile onto a User
//! record: find by provider ID, link by email, or create.

use axum::{
    Router,
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Json, Redirect},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::Utc;
use serde::Deserialize;

use super::middleware::{CurrentUser, require_admin, require_auth};
use super::session::{Session, create_session_token};
use crate::api::user_to_response;
use crate::data::{Database, EntityId, ROLE_USER, User};
use crate::error::AppError;
use crate::AppState;

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_INFO_URL: &str = "https://api.github.com/user";
const USER_EMAIL_URL: &str = "https://api.github.com/user/emails";

const SESSION_COOKIE: &str = "session";
const STATE_COOKIE: &str = "oauth_state";

/// Create authentication router
///
/// Routes:
/// - GET /auth/github - Redirect to GitHub
/// - GET /auth/github/callback - OAuth callback, establishes session
/// - GET /auth/logout - End session
/// - GET /auth/current - Current user info
/// - GET /auth/users - List users (admin)
pub fn auth_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", get(logout))
        .route("/auth/current", get(current_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/auth/users", get(list_users))
        .layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/auth/github", get(github_redirect))
        .route("/auth/github/callback", get(github_callback))
        .merge(protected)
        .merge(admin)
}

fn random_hex(bytes: usize) -> String {
    use rand::RngCore;

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /auth/github
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
async fn github_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let csrf_state = random_hex(16);

    let authorize_url = format!(
        "{}?client_id={}&redirect_uri={}&scope={}&state={}",
        AUTH_URL,
        urlencoding::encode(&state.config.auth.github.client_id),
        urlencoding::encode(&state.config.oauth_callback_url()),
        urlencoding::encode("user:email"),
        csrf_state,
    );

    let jar = jar.add(base_cookie(
        STATE_COOKIE,
        csrf_state,
        state.config.should_use_secure_cookies(),
    ));

    Ok((jar, Redirect::to(&authorize_url)))
}

/// Query parameters from GitHub callback
///
/// Both fields are required; they are optional here so an incomplete
/// callback answers with the standard JSON error shape instead of
/// axum's plain-text query rejection.
#[derive(Debug, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
}

/// GitHub token response
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: String,
}

/// GitHub user profile (the external provider profile)
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubProfile {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub html_url: Option<String>,
}

/// GitHub email information
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// GET /auth/github/callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state against the cookie
/// 2. Exchange code for access token
/// 3. Fetch user profile (and emails if the profile withheld one)
/// 4. Resolve local User (find / link / create)
/// 5. Create session and set cookie
/// 6. Redirect to home
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AppError::Validation(vec![
            "Missing code or state parameter".to_string(),
        ]));
    };

    let expected_state = jar
        .get(STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(AppError::Unauthorized)?;
    if expected_state != returned_state {
        return Err(AppError::Unauthorized);
    }

    let access_token = exchange_code(&state, &code).await?;
    let profile = fetch_github_profile(&state.http_client, &access_token).await?;

    tracing::info!(
        github_id = profile.id,
        login = %profile.login,
        "GitHub profile received"
    );

    let user = resolve_oauth_user(&state.db, &profile).await?;

    let session = Session::for_user(&user.id, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    let jar = jar
        .remove(removal_cookie(STATE_COOKIE))
        .add(base_cookie(
            SESSION_COOKIE,
            token,
            state.config.should_use_secure_cookies(),
        ));

    tracing::info!(username = %user.username, "Login successful");

    Ok((jar, Redirect::to("/")))
}

/// Exchange the authorization code for an access token.
async fn exchange_code(state: &AppState, code: &str) -> Result<String, AppError> {
    let response: GitHubTokenResponse = state
        .http_client
        .post(TOKEN_URL)
        .header("Accept", "application/json")
        .form(&[
            ("client_id", state.config.auth.github.client_id.as_str()),
            (
                "client_secret",
                state.config.auth.github.client_secret.as_str(),
            ),
            ("code", code),
            ("redirect_uri", state.config.oauth_callback_url().as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response.access_token)
}

/// Fetch the user profile from GitHub, falling back to the emails
/// endpoint when the profile carries no public email.
async fn fetch_github_profile(
    client: &reqwest::Client,
    access_token: &str,
) -> Result<GitHubProfile, AppError> {
    let mut profile: GitHubProfile = client
        .get(USER_INFO_URL)
        .header("Authorization", format!("Bearer {}", access_token))
        .header("Accept", "application/vnd.github+json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if profile.email.is_none() {
        let emails: Vec<GitHubEmail> = client
            .get(USER_EMAIL_URL)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        profile.email = emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.first())
            .map(|e| e.email.clone());
    }

    Ok(profile)
}

// =============================================================================
// Identity resolution
// =============================================================================

/// Placeholder address for users whose provider withheld their email.
///
/// Embeds the unique GitHub login, so two distinct GitHub users can
/// never collide on it. It is never treated as a contact address.
fn placeholder_email(login: &str) -> String {
    format!("{}@users.noreply.github.com", login)
}

/// Map an external GitHub profile onto a local User.
///
/// Runs once per successful handshake:
/// 1. find User by github_id - authenticate as that user;
/// 2. else derive a usable email (provider-supplied or placeholder);
/// 3. find User by that email - attach the github_id (account linking);
/// 4. else create a new User from the profile.
pub async fn resolve_oauth_user(
    db: &Database,
    profile: &GitHubProfile,
) -> Result<User, AppError> {
    let github_id = profile.id.to_string();

    if let Some(user) = db.find_user_by_github_id(&github_id).await? {
        tracing::info!(username = %user.username, "User found by GitHub ID");
        return Ok(user);
    }

    let email = profile
        .email
        .clone()
        .unwrap_or_else(|| placeholder_email(&profile.login))
        .trim()
        .to_lowercase();

    if let Some(mut user) = db.find_user_by_email(&email).await? {
        let now = Utc::now();
        db.link_user_github_id(&user.id, &github_id, now).await?;
        user.github_id = Some(github_id);
        user.updated_at = now;
        tracing::info!(username = %user.username, "Linked GitHub identity to existing account");
        return Ok(user);
    }

    let now = Utc::now();
    let user = User {
        id: EntityId::new().0,
        username: profile.login.clone(),
        email,
        password_hash: None,
        github_id: Some(github_id),
        display_name: profile.name.clone().or_else(|| Some(profile.login.clone())),
        profile_url: profile.html_url.clone(),
        role: ROLE_USER.to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_user(&user).await?;
    tracing::info!(username = %user.username, "New user created from GitHub profile");

    Ok(user)
}

// =============================================================================
// Session endpoints
// =============================================================================

/// GET /auth/logout
///
/// Clears the session cookie and redirects to home.
async fn logout(CurrentUser(user): CurrentUser, jar: CookieJar) -> impl IntoResponse {
    tracing::info!(username = %user.username, "Logging out");

    let jar = jar
        .remove(removal_cookie(SESSION_COOKIE))
        .remove(removal_cookie(STATE_COOKIE));

    (jar, Redirect::to("/"))
}

/// GET /auth/current
///
/// Returns the authenticated user's profile.
async fn current_user(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user": user_to_response(&user) }))
}

/// GET /auth/users (admin)
async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let users = state.db.list_users().await?;
    let users: Vec<_> = users.iter().map(user_to_response).collect();

    Ok(Json(serde_json::json!({
        "count": users.len(),
        "users": users,
    })))
}
