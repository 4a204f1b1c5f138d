//! Capacity accounting against a real `PostgreSQL` database.
//!
//! These tests require `TEST_DATABASE_URL` to point at a database the tests
//! may create tables in.
//!
//! Run with: cargo test -p volunteer-board-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use volunteer_board_integration_tests::TestServer;
use volunteer_board_server::db::{self, PgLedgerStore};

fn test_database_url() -> SecretString {
    SecretString::from(
        std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for these tests"),
    )
}

async fn pool() -> PgPool {
    let pool = db::create_pool(&test_database_url(), 5)
        .await
        .expect("Failed to connect to test database");
    db::ensure_schema(&pool).await.expect("Failed to apply schema");
    pool
}

/// Emails unique to one test run, so runs do not collide on the shared
/// database.
fn unique_email(label: &str) -> String {
    format!("{label}-{}@example.org", Uuid::new_v4().simple())
}

async fn cleanup(pool: &PgPool, post_id: &str) {
    let id = Uuid::parse_str(post_id).unwrap();
    sqlx::query("DELETE FROM volunteer_requests WHERE post_id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_postgres_concurrent_submissions_never_overcommit() {
    let pool = pool().await;
    let server = TestServer::spawn_with_store(Arc::new(PgLedgerStore::new(pool.clone()))).await;
    let organizer = unique_email("organizer");
    let post_id = server.create_post(&organizer, "2026-12-01", 2).await;

    let emails: Vec<String> = (0..20).map(|i| unique_email(&format!("v{i}"))).collect();
    let attempts = emails.iter().map(|email| {
        server
            .authed(server.client.post(server.url("/requests")), email)
            .json(&json!({"postId": post_id, "volunteerEmail": email}))
            .send()
    });
    let statuses: Vec<StatusCode> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|resp| resp.unwrap().status())
        .collect();

    let accepted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(accepted, 2);
    assert_eq!(server.get_post(&post_id).await["volunteersNeeded"], 0);

    let stored: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM volunteer_requests WHERE post_id = $1")
            .bind(Uuid::parse_str(&post_id).unwrap())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 2);

    cleanup(&pool, &post_id).await;
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_postgres_duplicate_request_rolls_back() {
    let pool = pool().await;
    let server = TestServer::spawn_with_store(Arc::new(PgLedgerStore::new(pool.clone()))).await;
    let organizer = unique_email("organizer");
    let volunteer = unique_email("volunteer");
    let post_id = server.create_post(&organizer, "2026-12-01", 3).await;

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let resp = server
            .authed(server.client.post(server.url("/requests")), &volunteer)
            .json(&json!({"postId": post_id, "volunteerEmail": volunteer}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }

    assert_eq!(server.get_post(&post_id).await["volunteersNeeded"], 2);

    cleanup(&pool, &post_id).await;
}
