//! API response shapes
//!
//! Serialized views of entities. Derived fields (age, availability,
//! isClassic, githubProfile) are computed here on the way out, never
//! stored. All field names are camelCase on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::data::{Author, Book, User};

// =============================================================================
// Author
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: String,
    pub name: String,
    pub bio: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    pub website: Option<String>,
    pub genres: Vec<String>,
    /// Derived from birthDate; null when absent
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn author_to_response(author: &Author) -> AuthorResponse {
    AuthorResponse {
        id: author.id.clone(),
        name: author.name.clone(),
        bio: author.bio.clone(),
        birth_date: author.birth_date,
        nationality: author.nationality.clone(),
        website: author.website.clone(),
        genres: author.genres.0.clone(),
        age: author.age(),
        created_at: author.created_at,
        updated_at: author.updated_at,
    }
}

/// Author fields embedded in a book detail response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub nationality: String,
}

pub fn author_to_summary(author: &Author) -> AuthorSummary {
    AuthorSummary {
        id: author.id.clone(),
        name: author.name.clone(),
        nationality: author.nationality.clone(),
    }
}

// =============================================================================
// Book
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub genre: String,
    pub published_year: Option<i32>,
    pub pages: Option<i32>,
    pub price: f64,
    pub in_stock: bool,
    pub tags: Vec<String>,
    pub summary: String,
    pub isbn: Option<String>,
    pub language: String,
    /// "In Stock" / "Out of Stock", derived from inStock
    pub availability: String,
    /// Derived: published 50+ years ago
    pub is_classic: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn book_to_response(book: &Book) -> BookResponse {
    BookResponse {
        id: book.id.clone(),
        title: book.title.clone(),
        author_id: book.author_id.clone(),
        genre: book.genre.clone(),
        published_year: book.published_year,
        pages: book.pages,
        price: book.price,
        in_stock: book.in_stock,
        tags: book.tags.0.clone(),
        summary: book.summary.clone(),
        isbn: book.isbn.clone(),
        language: book.language.clone(),
        availability: book.availability().to_string(),
        is_classic: book.is_classic(),
        created_at: book.created_at,
        updated_at: book.updated_at,
    }
}

/// Book detail enriched with its author
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub author: Option<AuthorSummary>,
}

/// Book fields projected in an author's book listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub published_year: Option<i32>,
    pub price: f64,
    pub availability: String,
}

pub fn book_to_summary(book: &Book) -> BookSummary {
    BookSummary {
        id: book.id.clone(),
        title: book.title.clone(),
        genre: book.genre.clone(),
        published_year: book.published_year,
        price: book.price,
        availability: book.availability().to_string(),
    }
}

// =============================================================================
// User
// =============================================================================

/// User view; the password hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub github_id: Option<String>,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
    pub role: String,
    /// Derived: profile link when the account is GitHub-linked
    pub github_profile: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        github_id: user.github_id.clone(),
        display_name: user.display_name.clone(),
        profile_url: user.profile_url.clone(),
        role: user.role.clone(),
        github_profile: user.github_profile(),
        created_at: user.created_at,
    }
}
