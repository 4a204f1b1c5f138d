//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                 - Liveness text
//! GET    /health           - Health check
//! GET    /health/ready     - Readiness (store reachable)
//!
//! # Posts
//! POST   /posts            - Create post (auth)
//! GET    /posts            - All posts by deadline
//! GET    /volunteer-posts  - Same listing, legacy path
//! GET    /posts/{id}       - Single post
//! PUT    /posts/{id}       - Update own post (auth)
//! DELETE /posts/{id}       - Delete own post (auth)
//! GET    /my-posts?email=  - Caller's posts (auth)
//!
//! # Volunteer requests
//! POST   /requests         - Submit request (auth)
//! GET    /my-requests?email= - Caller's requests (auth)
//! DELETE /requests/{id}    - Cancel own request (auth)
//! ```

pub mod posts;
pub mod requests;

use axum::{
    Json,
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use volunteer_board_core::VerifiedIdentity;

use crate::error::{AppError, Result};
use crate::services::ensure_claimed_owner;
use crate::state::AppState;

/// `?email=` query for the caller-scoped listings.
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Response from a delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResponse {
    fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Decode a JSON body owned by `caller`.
///
/// The claim in `owner_field` is checked against the caller first, so an
/// ownership mismatch is reported as 403 whatever else the body contains.
fn owned_body<T: DeserializeOwned>(
    caller: &VerifiedIdentity,
    payload: std::result::Result<Json<Value>, JsonRejection>,
    owner_field: &str,
) -> Result<T> {
    let Json(body) = payload?;
    ensure_claimed_owner(caller, &body, owner_field)?;
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Create the post routes router.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(posts::create).get(posts::index))
        .route("/volunteer-posts", get(posts::index))
        .route(
            "/posts/{id}",
            get(posts::show).put(posts::update).delete(posts::destroy),
        )
        .route("/my-posts", get(posts::mine))
}

/// Create the volunteer request routes router.
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(requests::create))
        .route("/my-requests", get(requests::mine))
        .route("/requests/{id}", delete(requests::destroy))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(post_routes())
        .merge(request_routes())
}

/// Liveness text for the root path.
async fn root() -> &'static str {
    "Volunteer Management Server Running"
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.ledger().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
