//! Field validation for submitted entity data
//!
//! Pure functions checking a submitted payload against business rules
//! before persistence. Every rule runs regardless of other failures;
//! the full list of violations comes back together. All range checks
//! are inclusive.

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::data::EntityId;

/// Whether missing required fields count as violations.
///
/// Creates require the full record; updates validate only what was
/// submitted (partial-field semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

// =============================================================================
// Payloads
// =============================================================================

/// Submitted author data, partial or full
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPayload {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub website: Option<String>,
    pub genres: Option<Vec<String>>,
}

/// Submitted book data, partial or full
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: Option<String>,
    pub author_id: Option<String>,
    pub genre: Option<String>,
    pub published_year: Option<i32>,
    pub pages: Option<i32>,
    pub price: Option<f64>,
    pub in_stock: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub isbn: Option<String>,
    pub language: Option<String>,
}

// =============================================================================
// Author rules
// =============================================================================

pub fn validate_author(payload: &AuthorPayload, mode: Mode) -> Vec<String> {
    let mut violations = Vec::new();

    match payload.name.as_deref().map(str::trim) {
        None if mode == Mode::Create => {
            violations.push("Author name is required".to_string());
        }
        Some(name) => {
            if name.chars().count() < 2 {
                violations.push("Author name must be at least 2 characters".to_string());
            }
            if name.chars().count() > 100 {
                violations.push("Author name must be less than 100 characters".to_string());
            }
        }
        None => {}
    }

    if let Some(bio) = &payload.bio {
        if bio.chars().count() > 1000 {
            violations.push("Biography must be less than 1000 characters".to_string());
        }
    }

    if let Some(birth_date) = payload.birth_date {
        if birth_date > Utc::now().date_naive() {
            violations.push("Birth date cannot be in the future".to_string());
        }
    }

    violations
}

// =============================================================================
// Book rules
// =============================================================================

pub fn validate_book(payload: &BookPayload, mode: Mode) -> Vec<String> {
    let mut violations = Vec::new();

    match payload.title.as_deref().map(str::trim) {
        None if mode == Mode::Create => {
            violations.push("Book title is required".to_string());
        }
        Some(title) => {
            if title.is_empty() {
                violations.push("Title cannot be empty".to_string());
            }
            if title.chars().count() > 200 {
                violations.push("Title must be less than 200 characters".to_string());
            }
        }
        None => {}
    }

    match payload.author_id.as_deref().map(str::trim) {
        None if mode == Mode::Create => {
            violations.push("Author ID is required".to_string());
        }
        Some(author_id) if !EntityId::is_valid(author_id) => {
            violations.push("Author ID must be a 24 character hex string".to_string());
        }
        _ => {}
    }

    if mode == Mode::Create && payload.genre.as_deref().map(str::trim).is_none() {
        violations.push("Genre is required".to_string());
    } else if let Some(genre) = payload.genre.as_deref() {
        if genre.trim().is_empty() {
            violations.push("Genre cannot be empty".to_string());
        }
    }

    if let Some(year) = payload.published_year {
        if year < 1000 {
            violations.push("Published year must be after 1000".to_string());
        }
        if year > Utc::now().year() {
            violations.push("Published year cannot be in the future".to_string());
        }
    }

    if let Some(pages) = payload.pages {
        if pages < 1 {
            violations.push("Pages must be at least 1".to_string());
        }
        if pages > 10_000 {
            violations.push("Pages cannot exceed 10000".to_string());
        }
    }

    match payload.price {
        None if mode == Mode::Create => {
            violations.push("Price is required".to_string());
        }
        Some(price) => {
            if price < 0.0 {
                violations.push("Price cannot be negative".to_string());
            }
            if price > 1000.0 {
                violations.push("Price cannot exceed 1000".to_string());
            }
        }
        None => {}
    }

    if let Some(tags) = &payload.tags {
        if tags.len() > 10 {
            violations.push("Cannot have more than 10 tags".to_string());
        }
    }

    if let Some(summary) = &payload.summary {
        if summary.chars().count() > 2000 {
            violations.push("Summary must be less than 2000 characters".to_string());
        }
    }

    if let Some(isbn) = payload.isbn.as_deref().map(str::trim) {
        if !is_valid_isbn(isbn) {
            violations.push("ISBN must be 10 or 13 digits".to_string());
        }
    }

    violations
}

fn is_valid_isbn(isbn: &str) -> bool {
    (isbn.len() == 10 || isbn.len() == 13) && isbn.chars().all(|c| c.is_ascii_digit())
}
