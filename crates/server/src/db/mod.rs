//! Storage for posts and volunteer requests.
//!
//! # Backends
//!
//! - [`PgLedgerStore`] - `PostgreSQL` via a sqlx pool (production)
//! - [`MemoryLedgerStore`] - process-local, for development and tests
//!
//! Both implement [`LedgerStore`], which the ledger service receives as an
//! explicit `Arc<dyn LedgerStore>`; there is no global connection handle.
//!
//! # Tables
//!
//! - `posts` - volunteer opportunities (free-form fields in `details` JSONB)
//! - `volunteer_requests` - one row per (`post_id`, `volunteer_email`)
//!
//! The schema is applied idempotently at startup by [`ensure_schema`].

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use volunteer_board_core::{Email, PostId, RequestId};

use crate::models::{Post, PostPatch, VolunteerRequest};

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate identifier).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Result of a partial update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Records selected by the filter (0 or 1).
    pub matched_count: u64,
    /// Records whose stored values actually changed.
    pub modified_count: u64,
}

/// Result of atomically claiming a slot on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Request stored and capacity decremented.
    Claimed {
        /// Capacity left on the post after the decrement.
        remaining: i32,
    },
    /// A request for the same (post, volunteer) pair already exists.
    Duplicate,
    /// The post is absent or has no capacity left; nothing was written.
    Exhausted,
}

/// Storage operations behind the post/request ledger.
///
/// Owner-filtered mutations (`update_post`, `delete_post`, `delete_request`)
/// only touch a record whose owner equals `owner`; a zero count means the
/// record is absent or owned by someone else.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a new post.
    async fn insert_post(&self, post: &Post) -> Result<(), RepositoryError>;

    /// All posts, ascending by deadline.
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError>;

    /// Fetch a single post.
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    /// Posts owned by `organizer`, in no particular order.
    async fn list_posts_by_organizer(
        &self,
        organizer: &Email,
    ) -> Result<Vec<Post>, RepositoryError>;

    /// Replace the supplied fields on a post owned by `owner`.
    async fn update_post(
        &self,
        id: PostId,
        owner: &Email,
        patch: &PostPatch,
    ) -> Result<UpdateOutcome, RepositoryError>;

    /// Delete a post owned by `owner`, returning the number deleted.
    async fn delete_post(&self, id: PostId, owner: &Email) -> Result<u64, RepositoryError>;

    /// Insert `request` and decrement its post's capacity as one atomic step.
    ///
    /// The insert only happens if no request exists for the same
    /// (post, volunteer) pair, and the decrement only if capacity is above
    /// zero. Either both writes happen or neither does.
    async fn claim_slot(&self, request: &VolunteerRequest) -> Result<ClaimOutcome, RepositoryError>;

    /// Fetch a single volunteer request.
    async fn get_request(&self, id: RequestId)
    -> Result<Option<VolunteerRequest>, RepositoryError>;

    /// Requests owned by `volunteer`.
    async fn list_requests_by_volunteer(
        &self,
        volunteer: &Email,
    ) -> Result<Vec<VolunteerRequest>, RepositoryError>;

    /// Delete a request owned by `owner`, returning the number deleted.
    ///
    /// Capacity on the referenced post is left untouched.
    async fn delete_request(&self, id: RequestId, owner: &Email) -> Result<u64, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Schema for the `PostgreSQL` backend. Every statement is idempotent.
///
/// `volunteer_requests.post_id` deliberately has no foreign key: deleting a
/// post leaves its requests in place.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS posts (
    id                UUID PRIMARY KEY,
    organizer_email   TEXT NOT NULL,
    deadline          TIMESTAMPTZ NOT NULL,
    volunteers_needed INTEGER NOT NULL CHECK (volunteers_needed >= 0),
    details           JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS posts_deadline_idx ON posts (deadline);
CREATE INDEX IF NOT EXISTS posts_organizer_email_idx ON posts (organizer_email);

CREATE TABLE IF NOT EXISTS volunteer_requests (
    id              UUID PRIMARY KEY,
    post_id         UUID NOT NULL,
    volunteer_email TEXT NOT NULL,
    details         JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT volunteer_requests_post_volunteer_key UNIQUE (post_id, volunteer_email)
);

CREATE INDEX IF NOT EXISTS volunteer_requests_volunteer_email_idx
    ON volunteer_requests (volunteer_email);
";

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the tables and indexes if they do not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if any DDL statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
