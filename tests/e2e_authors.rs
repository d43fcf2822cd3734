//! E2E tests for the /authors endpoints

mod common;

use common::TestServer;
use serde_json::json;

async fn create_author(server: &TestServer, cookie: &str, name: &str) -> serde_json::Value {
    let response = server
        .client
        .post(server.url("/authors"))
        .header("Cookie", cookie)
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_requires_a_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/authors"))
        .json(&json!({ "name": "Ursula K. Le Guin" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["loginUrl"], "/auth/github");
}

#[tokio::test]
async fn create_returns_author_with_derived_age() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    let response = server
        .client
        .post(server.url("/authors"))
        .header("Cookie", &cookie)
        .json(&json!({
            "name": "  Ursula K. Le Guin  ",
            "birthDate": "1929-10-21",
            "nationality": "American",
            "genres": ["Fantasy", "Science Fiction"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();

    // Name arrives trimmed, age is derived from birthDate
    assert_eq!(body["name"], "Ursula K. Le Guin");
    assert_eq!(body["genres"], json!(["Fantasy", "Science Fiction"]));
    assert!(body["age"].as_i64().unwrap() >= 94);
    assert_eq!(body["id"].as_str().unwrap().len(), 24);
}

#[tokio::test]
async fn create_reports_every_violation_at_once() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    let response = server
        .client
        .post(server.url("/authors"))
        .header("Cookie", &cookie)
        .json(&json!({
            "name": "A",
            "bio": "x".repeat(1001),
            "birthDate": "2999-01-01",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let violations = body["violations"].as_array().unwrap();

    let messages: Vec<&str> = violations.iter().filter_map(|v| v.as_str()).collect();
    assert!(messages.contains(&"Author name must be at least 2 characters"));
    assert!(messages.contains(&"Biography must be less than 1000 characters"));
    assert!(messages.contains(&"Birth date cannot be in the future"));
}

#[tokio::test]
async fn malformed_id_is_rejected_before_lookup() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/authors/not-a-valid-id"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid ID format");
}

#[tokio::test]
async fn unknown_author_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/authors/64f1b2c3d4e5f60718293a4b"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Author not found");
}

#[tokio::test]
async fn update_only_touches_submitted_fields() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    let author = create_author(&server, &cookie, "Stanislaw Lem").await;
    let id = author["id"].as_str().unwrap();

    let response = server
        .client
        .put(server.url(&format!("/authors/{}", id)))
        .header("Cookie", &cookie)
        .json(&json!({ "nationality": "Polish" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Stanislaw Lem");
    assert_eq!(body["nationality"], "Polish");
    assert_ne!(body["updatedAt"], author["updatedAt"]);
}

#[tokio::test]
async fn delete_is_blocked_while_books_reference_the_author() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    let author = create_author(&server, &cookie, "Frank Herbert").await;
    let author_id = author["id"].as_str().unwrap();

    let book_response = server
        .client
        .post(server.url("/books"))
        .header("Cookie", &cookie)
        .json(&json!({
            "title": "Dune",
            "authorId": author_id,
            "genre": "Science Fiction",
            "price": 10.99,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(book_response.status(), 201);
    let book: serde_json::Value = book_response.json().await.unwrap();

    // Blocked with the dependent count
    let blocked = server
        .client
        .delete(server.url(&format!("/authors/{}", author_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), 409);
    let body: serde_json::Value = blocked.json().await.unwrap();
    assert_eq!(body["dependents"], 1);

    // Removing the book unblocks the delete
    let removed = server
        .client
        .delete(server.url(&format!("/books/{}", book["id"].as_str().unwrap())))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), 200);

    let deleted = server
        .client
        .delete(server.url(&format!("/authors/{}", author_id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);
    let body: serde_json::Value = deleted.json().await.unwrap();
    assert_eq!(body["message"], "Author deleted");
}

#[tokio::test]
async fn listing_paginates_and_reports_totals() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    for i in 0..25 {
        create_author(&server, &cookie, &format!("Author {:02}", i)).await;
    }

    let response = server
        .client
        .get(server.url("/authors?page=2&limit=10"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["total"], 25);
    assert_eq!(body["pages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    // Sorted by name, so page 2 starts at the 11th name
    assert_eq!(body["data"][0]["name"], "Author 10");
}

#[tokio::test]
async fn out_of_range_pagination_is_rejected() {
    let server = TestServer::new().await;

    for query in ["page=0", "limit=0", "limit=101"] {
        let response = server
            .client
            .get(server.url(&format!("/authors?{}", query)))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "query {} must be rejected", query);
    }
}

#[tokio::test]
async fn enormous_page_numbers_yield_an_empty_page() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);
    create_author(&server, &cookie, "Only Author").await;

    let response = server
        .client
        .get(server.url("/authors?page=9223372036854775807&limit=100"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_numeric_pagination_falls_back_to_defaults() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);
    create_author(&server, &cookie, "Only Author").await;

    let response = server
        .client
        .get(server.url("/authors?page=abc&limit=xyz"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn author_books_subresource_projects_summaries() {
    let server = TestServer::new().await;
    let user = server.create_user("editor", "editor@example.com", "user").await;
    let cookie = server.session_cookie_for(&user);

    let author = create_author(&server, &cookie, "Frank Herbert").await;
    let author_id = author["id"].as_str().unwrap();

    for (title, year) in [("Dune", 1965), ("Dune Messiah", 1969)] {
        let response = server
            .client
            .post(server.url("/books"))
            .header("Cookie", &cookie)
            .json(&json!({
                "title": title,
                "authorId": author_id,
                "genre": "Science Fiction",
                "publishedYear": year,
                "price": 9.99,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = server
        .client
        .get(server.url(&format!("/authors/{}/books", author_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["author"]["name"], "Frank Herbert");
    assert_eq!(body["count"], 2);

    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["availability"], "In Stock");
    // Summaries carry no inStock flag, only the derived label
    assert!(books[0].get("inStock").is_none());
}
