//! Post/request ledger.
//!
//! Every operation that takes a [`VerifiedIdentity`] performs an ownership
//! check before touching the store: the caller's verified email must equal
//! the identity claimed in the payload and, for mutations of stored
//! records, the record's owner. A failed check writes nothing.
//!
//! Capacity accounting goes through [`LedgerStore::claim_slot`], which
//! inserts the request and decrements the post's counter atomically, so
//! concurrent submissions can never push `volunteersNeeded` below zero.

mod error;

pub use error::LedgerError;

use std::sync::Arc;

use volunteer_board_core::{PostId, RequestId, VerifiedIdentity};

use crate::db::{ClaimOutcome, LedgerStore, RepositoryError, UpdateOutcome};
use crate::models::{NewPost, NewVolunteerRequest, Post, PostPatch, VolunteerRequest, sanitize_details};

const EMAIL_MISMATCH: &str = "Forbidden - Email mismatch";
const UNAUTHORIZED_ACCESS: &str = "Forbidden - Unauthorized access";
const NOT_OWNER: &str = "Forbidden - Not the owner";
const NO_CAPACITY: &str = "No volunteers needed or post not found.";
const ALREADY_REQUESTED: &str = "You already requested this post.";

/// Result of an accepted volunteer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Identifier of the stored request.
    pub request_id: RequestId,
    /// Capacity left on the post after this request.
    pub remaining: i32,
}

/// Ledger service over an explicit store handle.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    /// Create a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        self.store.ping().await
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Create a post owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if `organizerEmail` is not the caller.
    /// Returns `LedgerError::InvalidRequest` if `volunteersNeeded` is negative.
    pub async fn create_post(
        &self,
        caller: &VerifiedIdentity,
        new_post: NewPost,
    ) -> Result<PostId, LedgerError> {
        if !caller.owns(&new_post.organizer_email) {
            return Err(LedgerError::Forbidden(EMAIL_MISMATCH));
        }
        ensure_non_negative(new_post.volunteers_needed)?;

        let post = new_post.into_post(PostId::generate());
        self.store.insert_post(&post).await?;

        tracing::info!(
            post_id = %post.id,
            organizer = %post.organizer_email,
            volunteers_needed = post.volunteers_needed,
            "Post created"
        );
        Ok(post.id)
    }

    /// All posts, ascending by deadline.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the store fails.
    pub async fn list_posts(&self) -> Result<Vec<Post>, LedgerError> {
        Ok(self.store.list_posts().await?)
    }

    /// Fetch one post. A malformed identifier is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if no post has this identifier.
    pub async fn get_post(&self, raw_id: &str) -> Result<Post, LedgerError> {
        let Ok(id) = PostId::parse(raw_id) else {
            return Err(LedgerError::NotFound("Post not found"));
        };

        self.store
            .get_post(id)
            .await?
            .ok_or(LedgerError::NotFound("Post not found"))
    }

    /// Posts owned by `email`, which must be the caller.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if `email` is missing or not the caller.
    pub async fn list_posts_by_organizer(
        &self,
        caller: &VerifiedIdentity,
        email: Option<&str>,
    ) -> Result<Vec<Post>, LedgerError> {
        if email != Some(caller.email.as_str()) {
            return Err(LedgerError::Forbidden(UNAUTHORIZED_ACCESS));
        }

        Ok(self.store.list_posts_by_organizer(&caller.email).await?)
    }

    /// Replace the supplied fields on a post the caller owns.
    ///
    /// An absent post is not an error: the outcome reports zero matches.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if `organizerEmail` is not the caller
    /// or the stored post belongs to someone else.
    /// Returns `LedgerError::InvalidRequest` for a malformed identifier or a
    /// negative `volunteersNeeded`.
    pub async fn update_post(
        &self,
        caller: &VerifiedIdentity,
        raw_id: &str,
        patch: PostPatch,
    ) -> Result<UpdateOutcome, LedgerError> {
        if !caller.owns(&patch.organizer_email) {
            return Err(LedgerError::Forbidden(EMAIL_MISMATCH));
        }
        let id = parse_post_id(raw_id)?;
        if let Some(needed) = patch.volunteers_needed {
            ensure_non_negative(needed)?;
        }

        let patch = PostPatch {
            details: sanitize_details(patch.details),
            ..patch
        };
        let outcome = self.store.update_post(id, &caller.email, &patch).await?;

        if outcome.matched_count == 0 && self.store.get_post(id).await?.is_some() {
            return Err(LedgerError::Forbidden(NOT_OWNER));
        }

        tracing::info!(
            post_id = %id,
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "Post updated"
        );
        Ok(outcome)
    }

    /// Delete a post the caller owns, returning the number deleted.
    ///
    /// Requests against the post are left in place and nothing is restored.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if the post belongs to someone else.
    /// Returns `LedgerError::InvalidRequest` for a malformed identifier.
    pub async fn delete_post(
        &self,
        caller: &VerifiedIdentity,
        raw_id: &str,
    ) -> Result<u64, LedgerError> {
        let id = parse_post_id(raw_id)?;
        let deleted = self.store.delete_post(id, &caller.email).await?;

        if deleted == 0 && self.store.get_post(id).await?.is_some() {
            return Err(LedgerError::Forbidden(NOT_OWNER));
        }

        tracing::info!(post_id = %id, deleted, "Post deleted");
        Ok(deleted)
    }

    // =========================================================================
    // Volunteer requests
    // =========================================================================

    /// Submit a volunteer request on behalf of the caller.
    ///
    /// Checks run in this order: ownership, post exists with capacity,
    /// no existing request for the pair. The final insert-and-decrement is
    /// atomic, so the capacity check is re-applied there and a post that
    /// fills up concurrently is still reported as exhausted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if `volunteerEmail` is not the caller.
    /// Returns `LedgerError::InvalidRequest` if the post is absent, has no
    /// capacity left, or `postId` is malformed.
    /// Returns `LedgerError::Conflict` if the caller already requested the post.
    pub async fn submit_request(
        &self,
        caller: &VerifiedIdentity,
        new_request: NewVolunteerRequest,
    ) -> Result<SubmitReceipt, LedgerError> {
        if !caller.owns(&new_request.volunteer_email) {
            return Err(LedgerError::Forbidden(EMAIL_MISMATCH));
        }

        let Ok(post_id) = PostId::parse(&new_request.post_id) else {
            return Err(LedgerError::InvalidRequest(NO_CAPACITY.to_string()));
        };

        match self.store.get_post(post_id).await? {
            Some(post) if post.volunteers_needed > 0 => {}
            _ => return Err(LedgerError::InvalidRequest(NO_CAPACITY.to_string())),
        }

        let request = VolunteerRequest {
            id: RequestId::generate(),
            post_id,
            volunteer_email: new_request.volunteer_email,
            details: sanitize_details(new_request.details),
        };

        match self.store.claim_slot(&request).await? {
            ClaimOutcome::Claimed { remaining } => {
                tracing::info!(
                    request_id = %request.id,
                    post_id = %post_id,
                    remaining,
                    "Volunteer request accepted"
                );
                Ok(SubmitReceipt {
                    request_id: request.id,
                    remaining,
                })
            }
            ClaimOutcome::Duplicate => Err(LedgerError::Conflict(ALREADY_REQUESTED)),
            ClaimOutcome::Exhausted => Err(LedgerError::InvalidRequest(NO_CAPACITY.to_string())),
        }
    }

    /// Requests owned by `email`, which must be the caller.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if `email` is missing or not the caller.
    pub async fn list_requests_by_volunteer(
        &self,
        caller: &VerifiedIdentity,
        email: Option<&str>,
    ) -> Result<Vec<VolunteerRequest>, LedgerError> {
        if email != Some(caller.email.as_str()) {
            return Err(LedgerError::Forbidden(UNAUTHORIZED_ACCESS));
        }

        Ok(self.store.list_requests_by_volunteer(&caller.email).await?)
    }

    /// Cancel a request the caller owns, returning the number deleted.
    ///
    /// The post's `volunteersNeeded` is NOT restored.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Forbidden` if the request belongs to someone else.
    /// Returns `LedgerError::InvalidRequest` for a malformed identifier.
    pub async fn cancel_request(
        &self,
        caller: &VerifiedIdentity,
        raw_id: &str,
    ) -> Result<u64, LedgerError> {
        let Ok(id) = RequestId::parse(raw_id) else {
            return Err(LedgerError::InvalidRequest(format!(
                "malformed request id {raw_id:?}"
            )));
        };

        let deleted = self.store.delete_request(id, &caller.email).await?;
        if deleted == 0 && self.store.get_request(id).await?.is_some() {
            return Err(LedgerError::Forbidden(NOT_OWNER));
        }

        tracing::info!(request_id = %id, deleted, "Volunteer request cancelled");
        Ok(deleted)
    }
}

/// Check the owner email a raw payload claims before the rest of it is
/// decoded, so a foreign claim is refused even when the body is invalid.
///
/// A missing or non-string `owner_field` counts as a mismatch.
///
/// # Errors
///
/// Returns `LedgerError::Forbidden` unless `payload[owner_field]` is exactly
/// the caller's email.
pub fn ensure_claimed_owner(
    caller: &VerifiedIdentity,
    payload: &serde_json::Value,
    owner_field: &str,
) -> Result<(), LedgerError> {
    let claimed = payload.get(owner_field).and_then(serde_json::Value::as_str);
    if claimed != Some(caller.email.as_str()) {
        return Err(LedgerError::Forbidden(EMAIL_MISMATCH));
    }
    Ok(())
}

fn parse_post_id(raw_id: &str) -> Result<PostId, LedgerError> {
    PostId::parse(raw_id)
        .map_err(|_| LedgerError::InvalidRequest(format!("malformed post id {raw_id:?}")))
}

fn ensure_non_negative(volunteers_needed: i32) -> Result<(), LedgerError> {
    if volunteers_needed < 0 {
        return Err(LedgerError::InvalidRequest(
            "volunteersNeeded must not be negative".to_string(),
        ));
    }
    Ok(())
}
