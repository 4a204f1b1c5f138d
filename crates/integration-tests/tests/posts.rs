//! Integration tests for the post endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use volunteer_board_integration_tests::TestServer;

const ORGANIZER: &str = "organizer@example.org";

// =============================================================================
// Public listing
// =============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let server = TestServer::spawn().await;

    let resp = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Volunteer Management Server Running");

    let resp = server.client.get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listing_is_sorted_by_deadline() {
    let server = TestServer::spawn().await;
    server.create_post(ORGANIZER, "2027-02-01", 1).await;
    server.create_post(ORGANIZER, "2026-11-15", 1).await;
    server.create_post(ORGANIZER, "2026-12-31T09:00:00Z", 1).await;

    for path in ["/posts", "/volunteer-posts"] {
        let posts: Vec<Value> = server
            .client
            .get(server.url(path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let deadlines: Vec<&str> = posts
            .iter()
            .map(|p| p["deadline"].as_str().unwrap())
            .collect();
        assert_eq!(deadlines.len(), 3);
        assert!(deadlines[0].starts_with("2026-11-15"));
        assert!(deadlines[1].starts_with("2026-12-31"));
        assert!(deadlines[2].starts_with("2027-02-01"));
    }
}

#[tokio::test]
async fn test_post_keeps_free_form_fields() {
    let server = TestServer::spawn().await;
    let id = server.create_post(ORGANIZER, "2026-12-01", 5).await;

    let post = server.get_post(&id).await;
    assert_eq!(post["_id"], id.as_str());
    assert_eq!(post["category"], "environment");
    assert_eq!(post["title"], "Beach cleanup");
    assert_eq!(post["volunteersNeeded"], 5);
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .get(server.url("/posts/00000000-0000-4000-8000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Authenticated operations
// =============================================================================

#[tokio::test]
async fn test_create_requires_token() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .post(server.url("/posts"))
        .json(&json!({"organizerEmail": ORGANIZER, "deadline": "2026-12-01", "volunteersNeeded": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let posts: Vec<Value> = server
        .client
        .get(server.url("/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_my_posts_only_for_caller() {
    let server = TestServer::spawn().await;
    server.create_post(ORGANIZER, "2026-12-01", 1).await;
    server.create_post("someone@example.org", "2026-12-02", 1).await;

    let resp = server
        .authed(server.client.get(server.url(&format!("/my-posts?email={ORGANIZER}"))), ORGANIZER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mine: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["organizerEmail"], ORGANIZER);

    let resp = server
        .authed(server.client.get(server.url("/my-posts?email=someone@example.org")), ORGANIZER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_by_non_owner_is_forbidden() {
    let server = TestServer::spawn().await;
    let id = server.create_post(ORGANIZER, "2026-12-01", 2).await;
    let intruder = "intruder@example.org";

    let resp = server
        .authed(server.client.put(server.url(&format!("/posts/{id}"))), intruder)
        .json(&json!({"organizerEmail": intruder, "volunteersNeeded": 50}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let post = server.get_post(&id).await;
    assert_eq!(post["volunteersNeeded"], 2);
    assert_eq!(post["organizerEmail"], ORGANIZER);
}

#[tokio::test]
async fn test_owner_updates_and_deletes() {
    let server = TestServer::spawn().await;
    let id = server.create_post(ORGANIZER, "2026-12-01", 2).await;

    let resp = server
        .authed(server.client.put(server.url(&format!("/posts/{id}"))), ORGANIZER)
        .json(&json!({"organizerEmail": ORGANIZER, "volunteersNeeded": "6", "location": "Pier 3"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["matchedCount"], 1);

    let post = server.get_post(&id).await;
    assert_eq!(post["volunteersNeeded"], 6);
    assert_eq!(post["location"], "Pier 3");
    assert_eq!(post["title"], "Beach cleanup");

    let resp = server
        .authed(server.client.delete(server.url(&format!("/posts/{id}"))), ORGANIZER)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"acknowledged": true, "deletedCount": 1}));

    let resp = server
        .client
        .get(server.url(&format!("/posts/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
