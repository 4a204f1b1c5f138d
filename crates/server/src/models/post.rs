//! Volunteer opportunity posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use volunteer_board_core::{Email, PostId};

use super::{Details, fields};

/// A volunteer opportunity published by an organizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: PostId,
    /// Owner of the post.
    pub organizer_email: Email,
    /// Sign-up deadline; listings are ordered by it.
    pub deadline: DateTime<Utc>,
    /// Remaining capacity, decremented once per accepted request.
    pub volunteers_needed: i32,
    /// Descriptive fields the server does not interpret.
    #[serde(flatten)]
    pub details: Details,
}

/// Payload for `POST /posts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub organizer_email: Email,
    #[serde(deserialize_with = "fields::deadline")]
    pub deadline: DateTime<Utc>,
    #[serde(deserialize_with = "fields::count")]
    pub volunteers_needed: i32,
    #[serde(flatten)]
    pub details: Details,
}

impl NewPost {
    /// JSON key carrying the organizer's ownership claim.
    pub const OWNER_FIELD: &'static str = "organizerEmail";

    /// Assign an identifier, producing the record to store.
    #[must_use]
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            organizer_email: self.organizer_email,
            deadline: self.deadline,
            volunteers_needed: self.volunteers_needed,
            details: super::sanitize_details(self.details),
        }
    }
}

/// Payload for `PUT /posts/{id}`.
///
/// Only the supplied keys are replaced. `organizerEmail` is mandatory
/// because it is the caller's ownership claim.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub organizer_email: Email,
    #[serde(default, deserialize_with = "fields::optional_deadline")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub volunteers_needed: Option<i32>,
    #[serde(flatten)]
    pub details: Details,
}

impl PostPatch {
    /// JSON key carrying the organizer's ownership claim.
    pub const OWNER_FIELD: &'static str = NewPost::OWNER_FIELD;

    /// Apply the patch to a stored post, returning whether anything changed.
    pub fn apply_to(&self, post: &mut Post) -> bool {
        let mut changed = false;

        if let Some(deadline) = self.deadline
            && post.deadline != deadline
        {
            post.deadline = deadline;
            changed = true;
        }

        if let Some(needed) = self.volunteers_needed
            && post.volunteers_needed != needed
        {
            post.volunteers_needed = needed;
            changed = true;
        }

        for (key, value) in &self.details {
            if post.details.get(key) != Some(value) {
                post.details.insert(key.clone(), value.clone());
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_post() -> Post {
        serde_json::from_value::<NewPost>(json!({
            "organizerEmail": "organizer@example.org",
            "deadline": "2026-12-01",
            "volunteersNeeded": 3,
            "title": "Food bank shift",
            "location": "Main St"
        }))
        .unwrap()
        .into_post(PostId::generate())
    }

    #[test]
    fn test_new_post_keeps_free_form_fields() {
        let post = sample_post();
        assert_eq!(post.volunteers_needed, 3);
        assert_eq!(post.details["title"], "Food bank shift");
        assert_eq!(post.details["location"], "Main St");
        assert!(!post.details.contains_key("organizerEmail"));
    }

    #[test]
    fn test_new_post_discards_client_id() {
        let post = serde_json::from_value::<NewPost>(json!({
            "_id": "client-chosen",
            "organizerEmail": "organizer@example.org",
            "deadline": "2026-12-01",
            "volunteersNeeded": "2"
        }))
        .unwrap()
        .into_post(PostId::generate());

        assert!(!post.details.contains_key("_id"));
        assert_eq!(post.volunteers_needed, 2);
    }

    #[test]
    fn test_post_serializes_with_mongo_style_id() {
        let post = sample_post();
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["_id"], json!(post.id.to_string()));
        assert_eq!(value["organizerEmail"], "organizer@example.org");
        assert_eq!(value["volunteersNeeded"], 3);
        assert_eq!(value["title"], "Food bank shift");
    }

    #[test]
    fn test_patch_replaces_only_supplied_keys() {
        let mut post = sample_post();
        let patch: PostPatch = serde_json::from_value(json!({
            "organizerEmail": "organizer@example.org",
            "title": "Evening food bank shift"
        }))
        .unwrap();

        assert!(patch.apply_to(&mut post));
        assert_eq!(post.details["title"], "Evening food bank shift");
        assert_eq!(post.details["location"], "Main St");
        assert_eq!(post.volunteers_needed, 3);

        // Applying the same patch again changes nothing.
        assert!(!patch.apply_to(&mut post));
    }

    #[test]
    fn test_patch_requires_organizer_email() {
        let patch = serde_json::from_value::<PostPatch>(json!({"title": "x"}));
        assert!(patch.is_err());
    }
}
