//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public base URL of this instance (e.g., "https://books.example.com")
    pub public_url: String,
    /// Deployment environment: "development" or "production"
    pub environment: String,
}

impl ServerConfig {
    /// Get the base URL for the instance, without a trailing slash
    pub fn base_url(&self) -> String {
        self.public_url.trim_end_matches('/').to_string()
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration (GitHub OAuth + sessions)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 86400 = 24h)
    pub session_max_age: i64,
    pub github: GitHubOAuthConfig,
}

/// GitHub OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL override; defaults to `{public_url}/auth/github/callback`
    pub callback_url: Option<String>,
}

impl AppConfig {
    /// Resolve the OAuth callback URL registered with GitHub.
    pub fn oauth_callback_url(&self) -> String {
        self.auth
            .github
            .callback_url
            .clone()
            .unwrap_or_else(|| format!("{}/auth/github/callback", self.server.base_url()))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (BOOKSHELF_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.public_url", "http://localhost:8080")?
            .set_default("server.environment", "development")?
            .set_default("database.path", "data/bookshelf.db")?
            .set_default("auth.session_max_age", 86_400)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (BOOKSHELF_*)
            .add_source(
                Environment::with_prefix("BOOKSHELF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Session cookies must be Secure whenever the instance is reachable
    /// beyond localhost.
    pub fn should_use_secure_cookies(&self) -> bool {
        public_url_scheme(&self.server.public_url).eq_ignore_ascii_case("https")
            || !is_local_public_url(&self.server.public_url)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        match self.server.environment.to_ascii_lowercase().as_str() {
            "development" | "production" => {}
            other => {
                return Err(crate::error::AppError::Config(format!(
                    "server.environment must be \"development\" or \"production\", got \"{}\"",
                    other
                )));
            }
        }

        if self.server.is_production()
            && !public_url_scheme(&self.server.public_url).eq_ignore_ascii_case("https")
            && !is_local_public_url(&self.server.public_url)
        {
            return Err(crate::error::AppError::Config(
                "server.public_url must be https in production".to_string(),
            ));
        }

        if !self.should_use_secure_cookies() {
            tracing::warn!(
                public_url = %self.server.public_url,
                "Using insecure session cookies for local development"
            );
        }

        Ok(())
    }
}

fn public_url_scheme(public_url: &str) -> String {
    url::Url::parse(public_url)
        .map(|url| url.scheme().to_string())
        .unwrap_or_else(|_| "http".to_string())
}

fn is_local_public_url(public_url: &str) -> bool {
    let Some(host) = url::Url::parse(public_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_ascii_lowercase()))
    else {
        return false;
    };

    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                environment: "development".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/bookshelf-test.db"),
            },
            auth: AuthConfig {
                session_secret: "x".repeat(32),
                session_max_age: 86_400,
                github: GitHubOAuthConfig {
                    client_id: "github-client-id".to_string(),
                    client_secret: "github-client-secret".to_string(),
                    callback_url: None,
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_http_on_localhost() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(!config.should_use_secure_cookies());
    }

    #[test]
    fn validate_rejects_short_session_secret() {
        let mut config = valid_config();
        config.auth.session_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("session secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.session_secret")
        ));
    }

    #[test]
    fn validate_rejects_http_public_url_in_production() {
        let mut config = valid_config();
        config.server.environment = "production".to_string();
        config.server.public_url = "http://books.example.com".to_string();

        let error = config
            .validate()
            .expect_err("production instances must require https");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("server.public_url must be https")
        ));
    }

    #[test]
    fn validate_rejects_unknown_environment() {
        let mut config = valid_config();
        config.server.environment = "staging".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn oauth_callback_url_defaults_from_public_url() {
        let config = valid_config();
        assert_eq!(
            config.oauth_callback_url(),
            "http://localhost:8080/auth/github/callback"
        );
    }
}
