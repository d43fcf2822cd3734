//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow and identity resolution
//! - Session management
//! - Authentication middleware

mod middleware;
mod oauth;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser, require_admin, require_auth, wants_login_redirect};
pub use oauth::{GitHubProfile, auth_router, resolve_oauth_user};
pub use session::{Session, create_session_token, verify_session_token};
