//! Volunteer request routes.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Serialize;
use serde_json::Value;

use volunteer_board_core::RequestId;

use super::{DeleteResponse, EmailQuery, owned_body};
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::models::{NewVolunteerRequest, VolunteerRequest};
use crate::state::AppState;

/// Response from an accepted volunteer request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestResponse {
    pub success: bool,
    pub inserted_id: RequestId,
    /// Capacity left on the post after this request.
    pub volunteers_needed: i32,
}

/// Submit a volunteer request on behalf of the caller.
///
/// POST /requests
///
/// # Errors
///
/// Returns 403 if `volunteerEmail` is not the caller, 400 if the post is
/// absent or full, 409 if the caller already requested it.
pub async fn create(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitRequestResponse>> {
    let new_request: NewVolunteerRequest =
        owned_body(&caller, payload, NewVolunteerRequest::OWNER_FIELD)?;
    let receipt = state.ledger().submit_request(&caller, new_request).await?;

    Ok(Json(SubmitRequestResponse {
        success: true,
        inserted_id: receipt.request_id,
        volunteers_needed: receipt.remaining,
    }))
}

/// List the caller's own requests.
///
/// GET /my-requests?email=
///
/// # Errors
///
/// Returns 403 unless `email` is the caller's.
pub async fn mine(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    query: std::result::Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<VolunteerRequest>>> {
    let Query(query) = query?;
    let requests = state
        .ledger()
        .list_requests_by_volunteer(&caller, query.email.as_deref())
        .await?;

    Ok(Json(requests))
}

/// Cancel a request the caller owns. Capacity is not restored.
///
/// DELETE /requests/{id}
///
/// # Errors
///
/// Returns 403 if the request belongs to someone else.
pub async fn destroy(
    State(state): State<AppState>,
    RequireIdentity(caller): RequireIdentity,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted_count = state.ledger().cancel_request(&caller, &id).await?;

    Ok(Json(DeleteResponse::new(deleted_count)))
}
