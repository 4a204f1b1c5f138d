//! Post routes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Serialize;
use serde_json::Value;

use volunteer_board_core::PostId;

use super::{DeleteResponse, EmailQuery, owned_body};
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::models::{NewPost, Post, PostPatch};
use crate::state::AppState;

/// Response from creating a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    pub inserted_id: PostId,
}

/// Response from updating a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostResponse {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Create a post owned by the caller.
///
/// POST /posts
///
/// # Errors
///
/// Returns 403 if `organizerEmail` is not the caller, 400 on a bad body.
pub async fn create(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatePostResponse>> {
    let new_post: NewPost = owned_body(&caller, payload, NewPost::OWNER_FIELD)?;
    let inserted_id = state.ledger().create_post(&caller, new_post).await?;

    Ok(Json(CreatePostResponse { inserted_id }))
}

/// List every post, soonest deadline first.
///
/// GET /posts, GET /volunteer-posts
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.ledger().list_posts().await?))
}

/// Fetch a single post.
///
/// GET /posts/{id}
///
/// # Errors
///
/// Returns 404 if the post does not exist or the identifier is malformed.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Post>> {
    Ok(Json(state.ledger().get_post(&id).await?))
}

/// List the caller's own posts.
///
/// GET /my-posts?email=
///
/// # Errors
///
/// Returns 403 unless `email` is the caller's.
pub async fn mine(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    query: std::result::Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>> {
    let Query(query) = query?;
    let posts = state
        .ledger()
        .list_posts_by_organizer(&caller, query.email.as_deref())
        .await?;

    Ok(Json(posts))
}

/// Replace the supplied fields of a post the caller owns.
///
/// PUT /posts/{id}
///
/// # Errors
///
/// Returns 403 on an ownership mismatch, 400 on a bad body or identifier.
pub async fn update(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdatePostResponse>> {
    let patch: PostPatch = owned_body(&caller, payload, PostPatch::OWNER_FIELD)?;
    let outcome = state.ledger().update_post(&caller, &id, patch).await?;

    Ok(Json(UpdatePostResponse {
        acknowledged: true,
        matched_count: outcome.matched_count,
        modified_count: outcome.modified_count,
    }))
}

/// Delete a post the caller owns.
///
/// DELETE /posts/{id}
///
/// # Errors
///
/// Returns 403 if the post belongs to someone else.
pub async fn destroy(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted_count = state.ledger().delete_post(&caller, &id).await?;

    Ok(Json(DeleteResponse::new(deleted_count)))
}
