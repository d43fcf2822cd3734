//! SQLite database operations
//!
//! All database access goes through this module. The `Database` handle
//! wraps a connection pool and is constructed explicitly at startup;
//! migrations run on connect.

use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Lowercase a user-supplied needle and escape LIKE metacharacters so
/// the pattern only ever matches literally.
fn like_fragment(needle: &str) -> String {
    needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the SQLite database at `path`.
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Authors
    // =========================================================================

    pub async fn insert_author(&self, author: &Author) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO authors (
                id, name, bio, birth_date, nationality, website, genres,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.id)
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.birth_date)
        .bind(&author.nationality)
        .bind(&author.website)
        .bind(&author.genres)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_author(&self, id: &str) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    pub async fn author_exists(&self, id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// List authors ordered by name, applying skip/limit.
    pub async fn list_authors(&self, skip: i64, limit: i64) -> Result<Vec<Author>, AppError> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY name ASC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    pub async fn count_authors(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn update_author(&self, author: &Author) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE authors SET
                name = ?, bio = ?, birth_date = ?, nationality = ?,
                website = ?, genres = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.birth_date)
        .bind(&author.nationality)
        .bind(&author.website)
        .bind(&author.genres)
        .bind(author.updated_at)
        .bind(&author.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete an author, returning the number of rows removed.
    ///
    /// Dependent-book checks happen in the controller before this runs.
    pub async fn delete_author(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Books
    // =========================================================================

    pub async fn insert_book(&self, book: &Book) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author_id, genre, published_year, pages, price,
                in_stock, tags, summary, isbn, language, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author_id)
        .bind(&book.genre)
        .bind(book.published_year)
        .bind(book.pages)
        .bind(book.price)
        .bind(book.in_stock)
        .bind(&book.tags)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(&book.language)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_book(&self, id: &str) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// List books sorted by title, optionally filtered by genre
    /// (case-insensitive substring match), applying skip/limit.
    pub async fn list_books(
        &self,
        genre: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Book>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM books");
        if let Some(genre) = genre {
            query.push(" WHERE LOWER(genre) LIKE '%' || ");
            query.push_bind(like_fragment(genre));
            query.push(" || '%' ESCAPE '\\'");
        }
        query.push(" ORDER BY title ASC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(skip);

        let books = query
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Count books under the same predicate as [`Database::list_books`],
    /// so paginated listings and totals always agree.
    pub async fn count_books(&self, genre: Option<&str>) -> Result<i64, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books");
        if let Some(genre) = genre {
            query.push(" WHERE LOWER(genre) LIKE '%' || ");
            query.push_bind(like_fragment(genre));
            query.push(" || '%' ESCAPE '\\'");
        }

        let count: i64 = query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Free-text search against title, genre, or tags (case-insensitive).
    ///
    /// Tags are matched element by element via json_each, never against
    /// the raw JSON encoding of the column.
    pub async fn search_books(&self, needle: &str) -> Result<Vec<Book>, AppError> {
        let fragment = like_fragment(needle);
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE LOWER(title) LIKE '%' || ? || '%' ESCAPE '\'
               OR LOWER(genre) LIKE '%' || ? || '%' ESCAPE '\'
               OR EXISTS (
                    SELECT 1 FROM json_each(books.tags)
                    WHERE LOWER(json_each.value) LIKE '%' || ? || '%' ESCAPE '\'
               )
            ORDER BY title ASC
            "#,
        )
        .bind(&fragment)
        .bind(&fragment)
        .bind(&fragment)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn list_books_by_author(&self, author_id: &str) -> Result<Vec<Book>, AppError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author_id = ? ORDER BY title ASC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Count of books referencing an author; gates author deletion.
    pub async fn count_books_by_author(&self, author_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn update_book(&self, book: &Book) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE books SET
                title = ?, author_id = ?, genre = ?, published_year = ?,
                pages = ?, price = ?, in_stock = ?, tags = ?, summary = ?,
                isbn = ?, language = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author_id)
        .bind(&book.genre)
        .bind(book.published_year)
        .bind(book.pages)
        .bind(book.price)
        .bind(book.in_stock)
        .bind(&book.tags)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(&book.language)
        .bind(book.updated_at)
        .bind(&book.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_book(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, github_id, display_name,
                profile_url, role, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.github_id)
        .bind(&user.display_name)
        .bind(&user.profile_url)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_github_id(
        &self,
        github_id: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE github_id = ?")
            .bind(github_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Look up by lowercased email; emails are stored lowercased.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Attach a GitHub identity to an existing account (account linking).
    pub async fn link_user_github_id(
        &self,
        user_id: &str,
        github_id: &str,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET github_id = ?, updated_at = ? WHERE id = ?")
            .bind(github_id)
            .bind(updated_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
