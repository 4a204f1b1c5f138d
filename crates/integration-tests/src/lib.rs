//! Integration tests for the volunteer board server.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process server with the in-memory store
//! cargo test -p volunteer-board-integration-tests
//!
//! # Also run the PostgreSQL-backed tests
//! TEST_DATABASE_URL=postgres://localhost/volunteer_board_test \
//!     cargo test -p volunteer-board-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `posts` - post endpoints over HTTP
//! - `requests` - volunteer requests, including concurrent submissions
//! - `postgres` - the same capacity rules against a real database
//!
//! Tests talk to a real server bound to `127.0.0.1:0`. Identity is served by
//! [`StaticVerifier`], which accepts `token-<email>` as a bearer token for
//! that email, so no issuer is contacted.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use volunteer_board_core::{Email, VerifiedIdentity};
use volunteer_board_server::{
    app,
    config::{DEFAULT_FIREBASE_JWKS_URL, IdentityConfig, ServerConfig},
    db::{LedgerStore, MemoryLedgerStore},
    identity::{IdentityError, IdentityVerifier},
    state::AppState,
};

/// Verifier that accepts `token-<email>` and rejects everything else.
pub struct StaticVerifier;

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let email = token
            .strip_prefix("token-")
            .and_then(|raw| Email::parse(raw).ok())
            .ok_or_else(|| IdentityError::InvalidCredential("unknown test token".to_string()))?;
        let subject = format!("uid-{email}");
        Ok(VerifiedIdentity::new(email, subject))
    }
}

/// A server running on an ephemeral port for the duration of a test.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server backed by a fresh in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryLedgerStore::new())).await
    }

    /// Start a server backed by `store`.
    pub async fn spawn_with_store(store: Arc<dyn LedgerStore>) -> Self {
        let config = ServerConfig::local(IdentityConfig {
            project_id: "volunteer-board-test".to_string(),
            jwks_url: Url::parse(DEFAULT_FIREBASE_JWKS_URL).expect("valid default JWKS URL"),
        });
        let listener = tokio::net::TcpListener::bind(config.socket_addr())
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");

        let router = app(AppState::new(config, store, Arc::new(StaticVerifier)));
        let handle = tokio::spawn(async move {
            axum_serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build a request authenticated as `email`.
    pub fn authed(&self, builder: RequestBuilder, email: &str) -> RequestBuilder {
        builder.bearer_auth(format!("token-{email}"))
    }

    /// Create a post owned by `organizer`, returning its identifier.
    pub async fn create_post(&self, organizer: &str, deadline: &str, volunteers_needed: i32) -> String {
        let response = self
            .authed(self.client.post(self.url("/posts")), organizer)
            .json(&json!({
                "organizerEmail": organizer,
                "title": "Beach cleanup",
                "category": "environment",
                "deadline": deadline,
                "volunteersNeeded": volunteers_needed,
            }))
            .send()
            .await
            .expect("Failed to create post");
        assert!(response.status().is_success(), "create post: {}", response.status());

        let body: Value = response.json().await.expect("create post body");
        body["insertedId"]
            .as_str()
            .expect("insertedId is a string")
            .to_string()
    }

    /// Fetch a post as JSON.
    pub async fn get_post(&self, id: &str) -> Value {
        self.client
            .get(self.url(&format!("/posts/{id}")))
            .send()
            .await
            .expect("Failed to fetch post")
            .json()
            .await
            .expect("post body")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn axum_serve(listener: tokio::net::TcpListener, router: axum::Router) {
    if let Err(e) = axum::serve(listener, router).await {
        panic!("test server failed: {e}");
    }
}
