//! Vote ledger domain service.
//!
//! Implements [`VoteCommand`] and [`VoteQuery`] over a [`VoteRepository`].
//! Uniqueness is left entirely to the repository: the service never checks
//! for an existing vote before inserting.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound as _;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{VoteCommand, VoteQuery, VoteRepository, VoteRepositoryError};
use crate::domain::{ChapterId, Error, StoryId, Vote, VoteKey};

/// Vote service implementing the vote driving ports.
#[derive(Clone)]
pub struct VoteLedgerService<R> {
    vote_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> VoteLedgerService<R> {
    /// Create a service stamping votes with `clock`.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use engagement_ledger::domain::VoteLedgerService;
    /// # use engagement_ledger::test_support::InMemoryEngagementStore;
    /// let store = Arc::new(InMemoryEngagementStore::default());
    /// let _service = VoteLedgerService::new(store, Arc::new(DefaultClock));
    /// ```
    pub fn new(vote_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { vote_repo, clock }
    }
}

fn map_vote_error(error: VoteRepositoryError) -> Error {
    match error {
        VoteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("vote ledger unavailable: {message}"))
        }
        VoteRepositoryError::Query { message } => {
            Error::internal(format!("vote ledger error: {message}"))
        }
        VoteRepositoryError::AlreadyVoted { chapter_id } => {
            Error::conflict("user has already voted on this chapter").with_details(json!({
                "code": "already_voted",
                "chapterId": chapter_id,
            }))
        }
        VoteRepositoryError::NotVoted { chapter_id } => {
            Error::not_found("user has not voted on this chapter").with_details(json!({
                "code": "not_voted",
                "chapterId": chapter_id,
            }))
        }
        VoteRepositoryError::UnknownChapter { chapter_id } => {
            Error::not_found(format!("chapter {chapter_id} not found")).with_details(json!({
                "code": "chapter_not_found",
                "chapterId": chapter_id,
            }))
        }
        VoteRepositoryError::UnknownUser { user_id } => {
            Error::not_found("user is not provisioned").with_details(json!({
                "code": "user_not_found",
                "userId": user_id,
            }))
        }
    }
}

#[async_trait]
impl<R> VoteCommand for VoteLedgerService<R>
where
    R: VoteRepository,
{
    async fn cast_vote(&self, key: &VoteKey) -> Result<Vote, Error> {
        // Stored timestamps keep microsecond precision.
        let vote = Vote::new(*key, self.clock.utc().trunc_subsecs(6));
        self.vote_repo
            .insert_vote(&vote)
            .await
            .map_err(map_vote_error)?;
        Ok(vote)
    }

    async fn retract_vote(&self, key: &VoteKey) -> Result<(), Error> {
        self.vote_repo.delete_vote(key).await.map_err(map_vote_error)
    }
}

#[async_trait]
impl<R> VoteQuery for VoteLedgerService<R>
where
    R: VoteRepository,
{
    async fn has_voted(&self, key: &VoteKey) -> Result<bool, Error> {
        let vote = self.vote_repo.find_vote(key).await.map_err(map_vote_error)?;
        Ok(vote.is_some())
    }

    async fn count_votes_for_chapter(&self, chapter_id: ChapterId) -> Result<u64, Error> {
        self.vote_repo
            .count_for_chapter(chapter_id)
            .await
            .map_err(map_vote_error)
    }

    async fn count_votes_for_story(&self, story_id: StoryId) -> Result<u64, Error> {
        self.vote_repo
            .count_for_story(story_id)
            .await
            .map_err(map_vote_error)
    }
}

#[cfg(test)]
#[path = "vote_ledger_service_tests.rs"]
mod tests;
