//! Database tests

use super::*;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use tempfile::TempDir;

use crate::error::AppError;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn make_author(name: &str) -> Author {
    Author {
        id: EntityId::new().0,
        name: name.to_string(),
        bio: String::new(),
        birth_date: NaiveDate::from_ymd_opt(1920, 1, 2),
        nationality: "British".to_string(),
        website: None,
        genres: Json(vec!["Science Fiction".to_string()]),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn make_book(title: &str, author_id: &str, genre: &str, tags: Vec<String>) -> Book {
    Book {
        id: EntityId::new().0,
        title: title.to_string(),
        author_id: author_id.to_string(),
        genre: genre.to_string(),
        published_year: Some(1954),
        pages: Some(300),
        price: 15.0,
        in_stock: true,
        tags: Json(tags),
        summary: String::new(),
        isbn: None,
        language: "English".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn make_user(username: &str, email: &str) -> User {
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: None,
        github_id: None,
        display_name: None,
        profile_url: None,
        role: ROLE_USER.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
}

#[tokio::test]
async fn test_author_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let mut author = make_author("Arthur C. Clarke");
    db.insert_author(&author).await.unwrap();

    let retrieved = db.get_author(&author.id).await.unwrap().unwrap();
    assert_eq!(retrieved.name, "Arthur C. Clarke");
    assert_eq!(retrieved.genres.0, vec!["Science Fiction".to_string()]);
    assert_eq!(retrieved.birth_date, NaiveDate::from_ymd_opt(1920, 1, 2));

    author.bio = "Author of 2001".to_string();
    author.updated_at = Utc::now();
    db.update_author(&author).await.unwrap();
    let retrieved = db.get_author(&author.id).await.unwrap().unwrap();
    assert_eq!(retrieved.bio, "Author of 2001");

    assert_eq!(db.delete_author(&author.id).await.unwrap(), 1);
    assert!(db.get_author(&author.id).await.unwrap().is_none());
    assert_eq!(db.delete_author(&author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_listing_is_paginated_and_sorted() {
    let (db, _temp_dir) = create_test_db().await;

    for name in ["Carla", "Ann", "Ben"] {
        db.insert_author(&make_author(name)).await.unwrap();
    }

    assert_eq!(db.count_authors().await.unwrap(), 3);

    let page = db.list_authors(0, 2).await.unwrap();
    let names: Vec<_> = page.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Ben"]);

    let page = db.list_authors(2, 2).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Carla");
}

#[tokio::test]
async fn test_book_listing_filters_by_genre_with_matching_count() {
    let (db, _temp_dir) = create_test_db().await;

    let author = make_author("N. K. Jemisin");
    db.insert_author(&author).await.unwrap();

    db.insert_book(&make_book("The Fifth Season", &author.id, "Fantasy", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book("The Obelisk Gate", &author.id, "Epic Fantasy", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book("The City We Became", &author.id, "Urban", vec![]))
        .await
        .unwrap();

    let filtered = db.list_books(Some("fantasy"), 0, 10).await.unwrap();
    assert_eq!(filtered.len(), 2);
    assert_eq!(db.count_books(Some("fantasy")).await.unwrap(), 2);
    assert_eq!(db.count_books(None).await.unwrap(), 3);

    // Sorted by title ascending
    assert_eq!(filtered[0].title, "The Fifth Season");
    assert_eq!(filtered[1].title, "The Obelisk Gate");
}

#[tokio::test]
async fn test_search_matches_title_genre_and_tags() {
    let (db, _temp_dir) = create_test_db().await;

    let author = make_author("Various");
    db.insert_author(&author).await.unwrap();

    db.insert_book(&make_book("Fantasy Omnibus", &author.id, "Anthology", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book("Quiet River", &author.id, "Dark Fantasy", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book(
        "Hidden Doors",
        &author.id,
        "Mystery",
        vec!["fantasy".to_string()],
    ))
    .await
    .unwrap();
    db.insert_book(&make_book("Plain History", &author.id, "History", vec![]))
        .await
        .unwrap();

    let found = db.search_books("FANTASY").await.unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|b| b.title != "Plain History"));
}

#[tokio::test]
async fn test_like_metacharacters_match_literally() {
    let (db, _temp_dir) = create_test_db().await;

    let author = make_author("Various");
    db.insert_author(&author).await.unwrap();

    db.insert_book(&make_book("100% Proof", &author.id, "Non_Fiction", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book("Plain History", &author.id, "History", vec![]))
        .await
        .unwrap();

    // "%" and "_" are literal characters, not wildcards
    let found = db.search_books("%").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "100% Proof");

    assert_eq!(db.count_books(Some("n_f")).await.unwrap(), 1);
    assert_eq!(db.count_books(Some("n_n")).await.unwrap(), 0);

    let filtered = db.list_books(Some("_"), 0, 10).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].genre, "Non_Fiction");
}

#[tokio::test]
async fn test_search_matches_tag_values_not_json_encoding() {
    let (db, _temp_dir) = create_test_db().await;

    let author = make_author("Various");
    db.insert_author(&author).await.unwrap();

    db.insert_book(&make_book(
        "Tagged Twice",
        &author.id,
        "Fiction",
        vec!["alpha".to_string(), "beta".to_string()],
    ))
    .await
    .unwrap();

    // "," and "\"" only appear in the stored JSON array, not in any tag
    assert!(db.search_books(",").await.unwrap().is_empty());
    assert!(db.search_books("\"").await.unwrap().is_empty());
    assert_eq!(db.search_books("beta").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_count_books_by_author() {
    let (db, _temp_dir) = create_test_db().await;

    let with_books = make_author("Busy Writer");
    let without_books = make_author("Quiet Writer");
    db.insert_author(&with_books).await.unwrap();
    db.insert_author(&without_books).await.unwrap();

    db.insert_book(&make_book("One", &with_books.id, "Fiction", vec![]))
        .await
        .unwrap();
    db.insert_book(&make_book("Two", &with_books.id, "Fiction", vec![]))
        .await
        .unwrap();

    assert_eq!(db.count_books_by_author(&with_books.id).await.unwrap(), 2);
    assert_eq!(db.count_books_by_author(&without_books.id).await.unwrap(), 0);

    let books = db.list_books_by_author(&with_books.id).await.unwrap();
    assert_eq!(books.len(), 2);
}

#[tokio::test]
async fn test_user_lookup_and_github_linking() {
    let (db, _temp_dir) = create_test_db().await;

    let user = make_user("reader", "reader@example.com");
    db.insert_user(&user).await.unwrap();

    // Email lookup is case-insensitive because emails are stored lowercased
    let found = db.find_user_by_email("Reader@Example.com").await.unwrap();
    assert!(found.is_some());

    assert!(db.find_user_by_github_id("4242").await.unwrap().is_none());

    db.link_user_github_id(&user.id, "4242", Utc::now())
        .await
        .unwrap();
    let linked = db.find_user_by_github_id("4242").await.unwrap().unwrap();
    assert_eq!(linked.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&make_user("first", "same@example.com"))
        .await
        .unwrap();
    let err = db
        .insert_user(&make_user("second", "same@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}
