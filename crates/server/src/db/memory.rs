//! Process-local implementation of [`LedgerStore`].
//!
//! Every operation runs under one async mutex, which makes `claim_slot`
//! trivially atomic. Contents are lost when the process exits.

use async_trait::async_trait;
use tokio::sync::Mutex;

use volunteer_board_core::{Email, PostId, RequestId};

use super::{ClaimOutcome, LedgerStore, RepositoryError, UpdateOutcome};
use crate::models::{Post, PostPatch, VolunteerRequest};

#[derive(Debug, Default)]
struct Collections {
    posts: Vec<Post>,
    requests: Vec<VolunteerRequest>,
}

/// Ledger storage held in memory.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Collections>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_post(&self, post: &Post) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.posts.iter().any(|p| p.id == post.id) {
            return Err(RepositoryError::Conflict(format!(
                "post {} already exists",
                post.id
            )));
        }
        inner.posts.push(post.clone());
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let mut posts = self.inner.lock().await.posts.clone();
        // Stable sort keeps insertion order among equal deadlines.
        posts.sort_by_key(|p| p.deadline);
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts_by_organizer(
        &self,
        organizer: &Email,
    ) -> Result<Vec<Post>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .posts
            .iter()
            .filter(|p| &p.organizer_email == organizer)
            .cloned()
            .collect())
    }

    async fn update_post(
        &self,
        id: PostId,
        owner: &Email,
        patch: &PostPatch,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Some(post) = inner
            .posts
            .iter_mut()
            .find(|p| p.id == id && &p.organizer_email == owner)
        else {
            return Ok(UpdateOutcome::default());
        };

        let modified = patch.apply_to(post);
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_post(&self, id: PostId, owner: &Email) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let before = inner.posts.len();
        inner
            .posts
            .retain(|p| !(p.id == id && &p.organizer_email == owner));
        Ok((before - inner.posts.len()) as u64)
    }

    async fn claim_slot(&self, request: &VolunteerRequest) -> Result<ClaimOutcome, RepositoryError> {
        let mut inner = self.inner.lock().await;

        let duplicate = inner.requests.iter().any(|r| {
            r.post_id == request.post_id && r.volunteer_email == request.volunteer_email
        });
        if duplicate {
            return Ok(ClaimOutcome::Duplicate);
        }

        let Some(post) = inner
            .posts
            .iter_mut()
            .find(|p| p.id == request.post_id && p.volunteers_needed > 0)
        else {
            return Ok(ClaimOutcome::Exhausted);
        };

        post.volunteers_needed -= 1;
        let remaining = post.volunteers_needed;
        inner.requests.push(request.clone());

        Ok(ClaimOutcome::Claimed { remaining })
    }

    async fn get_request(
        &self,
        id: RequestId,
    ) -> Result<Option<VolunteerRequest>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests_by_volunteer(
        &self,
        volunteer: &Email,
    ) -> Result<Vec<VolunteerRequest>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .iter()
            .filter(|r| &r.volunteer_email == volunteer)
            .cloned()
            .collect())
    }

    async fn delete_request(&self, id: RequestId, owner: &Email) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let before = inner.requests.len();
        inner
            .requests
            .retain(|r| !(r.id == id && &r.volunteer_email == owner));
        Ok((before - inner.requests.len()) as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
