//! Volunteer requests (a volunteer's claim against a post).

use serde::{Deserialize, Serialize};

use volunteer_board_core::{Email, PostId, RequestId};

use super::Details;

/// A stored volunteer request.
///
/// At most one exists per (`post_id`, `volunteer_email`) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerRequest {
    #[serde(rename = "_id")]
    pub id: RequestId,
    /// Post this request claims a slot on (a reference, not ownership).
    pub post_id: PostId,
    /// Owner of the request.
    pub volunteer_email: Email,
    #[serde(flatten)]
    pub details: Details,
}

/// Payload for `POST /requests`.
///
/// `postId` stays a raw string so a malformed identifier is reported as an
/// invalid submission rather than a body decoding failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVolunteerRequest {
    pub post_id: String,
    pub volunteer_email: Email,
    #[serde(flatten)]
    pub details: Details,
}

impl NewVolunteerRequest {
    /// JSON key carrying the volunteer's ownership claim.
    pub const OWNER_FIELD: &'static str = "volunteerEmail";
}
