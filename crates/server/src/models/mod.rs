//! Domain models for the volunteer board.
//!
//! Documents are exchanged as camelCase JSON with a Mongo-style `_id` so
//! existing clients keep working. Fields the server does not interpret are
//! carried verbatim in a `details` map and flattened back out on the wire.

pub mod fields;
pub mod post;
pub mod request;

pub use post::{NewPost, Post, PostPatch};
pub use request::{NewVolunteerRequest, VolunteerRequest};

/// Free-form descriptive fields (title, description, location, ...).
pub type Details = serde_json::Map<String, serde_json::Value>;

/// Keys that identify a stored document and are never taken from clients.
const RESERVED_KEYS: &[&str] = &["_id", "id"];

/// Drop client-supplied identifiers from free-form fields.
#[must_use]
pub fn sanitize_details(mut details: Details) -> Details {
    for key in RESERVED_KEYS {
        details.remove(*key);
    }
    details
}
