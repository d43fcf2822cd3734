//! Data models
//!
//! Rust structs representing database entities. IDs are 24-character
//! lowercase hex strings; timestamps use chrono. Derived fields (age,
//! availability, githubProfile) are computed on serialization, never stored.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (24 hex characters)
///
/// Example: "64f1b2c3d4e5f60718293a4b"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new random 24-hex-char ID
    pub fn new() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut id = String::with_capacity(24);
        for byte in bytes {
            id.push_str(&format!("{:02x}", byte));
        }
        Self(id)
    }

    /// Check whether a raw path parameter is a well-formed ID.
    ///
    /// Must run before any data access; malformed IDs short-circuit
    /// with a client error.
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == 24 && raw.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Author
// =============================================================================

/// A catalog author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub bio: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    pub website: Option<String>,
    /// Genres the author writes in, stored as a JSON array
    pub genres: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Full years between birth_date and `today`, None if birth_date absent.
    pub fn age_at(&self, today: NaiveDate) -> Option<i32> {
        let birth = self.birth_date?;
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        Some(age)
    }

    pub fn age(&self) -> Option<i32> {
        self.age_at(Utc::now().date_naive())
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog book, referencing its author by ID
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    /// References an existing Author; checked at create and update
    pub author_id: String,
    pub genre: String,
    pub published_year: Option<i32>,
    pub pages: Option<i32>,
    pub price: f64,
    pub in_stock: bool,
    /// Up to 10 tags, stored as a JSON array
    pub tags: Json<Vec<String>>,
    pub summary: String,
    pub isbn: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How many years a book must be in print to count as a classic.
pub const CLASSIC_AGE_YEARS: i32 = 50;

impl Book {
    pub fn availability(&self) -> &'static str {
        if self.in_stock { "In Stock" } else { "Out of Stock" }
    }

    /// A book is a classic once it has been in print for 50+ years.
    pub fn is_classic_in(&self, current_year: i32) -> bool {
        self.published_year
            .map(|year| current_year - year >= CLASSIC_AGE_YEARS)
            .unwrap_or(false)
    }

    pub fn is_classic(&self) -> bool {
        self.is_classic_in(Utc::now().year())
    }
}

// =============================================================================
// User
// =============================================================================

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A local user account, created or linked lazily on OAuth callback
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Stored lowercased; unique
    pub email: String,
    /// bcrypt hash; never serialized to clients
    pub password_hash: Option<String>,
    /// GitHub user ID as a string; unique when present
    pub github_id: Option<String>,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
    /// "user" or "admin"
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// bcrypt cost factor for password hashing
const BCRYPT_COST: u32 = 12;

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Hash and store a password. Must run before the record is
    /// persisted; plaintext never reaches the database.
    pub fn set_password(&mut self, plain: &str) -> Result<(), crate::error::AppError> {
        let hash = bcrypt::hash(plain, BCRYPT_COST)
            .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
        self.password_hash = Some(hash);
        Ok(())
    }

    /// Compare a candidate password; false when no password is set.
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password_hash
            .as_deref()
            .map(|hash| bcrypt::verify(candidate, hash).unwrap_or(false))
            .unwrap_or(false)
    }

    /// GitHub profile URL when the account is linked to GitHub.
    pub fn github_profile(&self) -> Option<String> {
        self.github_id
            .as_ref()
            .map(|_| format!("https://github.com/{}", self.username))
    }
}
