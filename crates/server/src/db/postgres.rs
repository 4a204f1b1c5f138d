//! `PostgreSQL` implementation of [`LedgerStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use volunteer_board_core::{Email, PostId, RequestId};

use super::{ClaimOutcome, LedgerStore, RepositoryError, UpdateOutcome};
use crate::models::{Details, Post, PostPatch, VolunteerRequest};

const POST_COLUMNS: &str = "id, organizer_email, deadline, volunteers_needed, details";
const REQUEST_COLUMNS: &str = "id, post_id, volunteer_email, details";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: PostId,
    organizer_email: String,
    deadline: DateTime<Utc>,
    volunteers_needed: i32,
    details: Json<Details>,
}

impl TryFrom<PostRow> for Post {
    type Error = RepositoryError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let organizer_email = Email::parse(&row.organizer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid organizer email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            organizer_email,
            deadline: row.deadline,
            volunteers_needed: row.volunteers_needed,
            details: row.details.0,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: RequestId,
    post_id: PostId,
    volunteer_email: String,
    details: Json<Details>,
}

impl TryFrom<RequestRow> for VolunteerRequest {
    type Error = RepositoryError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let volunteer_email = Email::parse(&row.volunteer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid volunteer email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            post_id: row.post_id,
            volunteer_email,
            details: row.details.0,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Ledger storage backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_post(&self, post: &Post) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO posts (id, organizer_email, deadline, volunteers_needed, details)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(post.id)
        .bind(&post.organizer_email)
        .bind(post.deadline)
        .bind(post.volunteers_needed)
        .bind(Json(&post.details))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("post {} already exists", post.id));
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY deadline ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    async fn list_posts_by_organizer(
        &self,
        organizer: &Email,
    ) -> Result<Vec<Post>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE organizer_email = $1"
        ))
        .bind(organizer)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn update_post(
        &self,
        id: PostId,
        owner: &Email,
        patch: &PostPatch,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND organizer_email = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(UpdateOutcome::default());
        };

        let mut post = Post::try_from(row)?;
        if !patch.apply_to(&mut post) {
            tx.commit().await?;
            return Ok(UpdateOutcome {
                matched_count: 1,
                modified_count: 0,
            });
        }

        sqlx::query(
            r"
            UPDATE posts
            SET deadline = $2, volunteers_needed = $3, details = $4
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(post.deadline)
        .bind(post.volunteers_needed)
        .bind(Json(&post.details))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
        })
    }

    async fn delete_post(&self, id: PostId, owner: &Email) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND organizer_email = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn claim_slot(&self, request: &VolunteerRequest) -> Result<ClaimOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The unique (post_id, volunteer_email) constraint makes this an
        // insert-if-absent; a concurrent duplicate waits on our commit.
        let inserted = sqlx::query(
            r"
            INSERT INTO volunteer_requests (id, post_id, volunteer_email, details)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (post_id, volunteer_email) DO NOTHING
            ",
        )
        .bind(request.id)
        .bind(request.post_id)
        .bind(&request.volunteer_email)
        .bind(Json(&request.details))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(ClaimOutcome::Duplicate);
        }

        let remaining: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE posts
            SET volunteers_needed = volunteers_needed - 1
            WHERE id = $1 AND volunteers_needed > 0
            RETURNING volunteers_needed
            ",
        )
        .bind(request.post_id)
        .fetch_optional(&mut *tx)
        .await?;

        match remaining {
            Some(remaining) => {
                tx.commit().await?;
                Ok(ClaimOutcome::Claimed { remaining })
            }
            None => {
                // Undo the insert: the post vanished or filled up meanwhile.
                tx.rollback().await?;
                Ok(ClaimOutcome::Exhausted)
            }
        }
    }

    async fn get_request(
        &self,
        id: RequestId,
    ) -> Result<Option<VolunteerRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM volunteer_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VolunteerRequest::try_from).transpose()
    }

    async fn list_requests_by_volunteer(
        &self,
        volunteer: &Email,
    ) -> Result<Vec<VolunteerRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM volunteer_requests WHERE volunteer_email = $1 ORDER BY created_at ASC"
        ))
        .bind(volunteer)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn delete_request(&self, id: RequestId, owner: &Email) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM volunteer_requests WHERE id = $1 AND volunteer_email = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
