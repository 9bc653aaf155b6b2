//! Driven port for vote storage.
//!
//! Implementations must enforce at most one vote per [`VoteKey`] with a
//! storage-level constraint. Checking for an existing vote and then inserting
//! is not an acceptable implementation: two concurrent casts must resolve to
//! exactly one stored vote and one [`VoteRepositoryError::AlreadyVoted`].

use async_trait::async_trait;

use crate::domain::{ChapterId, StoryId, Vote, VoteKey};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vote repository adapters.
    pub enum VoteRepositoryError {
        /// The store could not be reached or timed out.
        Connection { message: String } =>
            "vote repository connection failed: {message}",
        /// A query failed during execution.
        Query { message: String } =>
            "vote repository query failed: {message}",
        /// A vote already exists for the key.
        AlreadyVoted { chapter_id: i64 } =>
            "a vote already exists for chapter {chapter_id}",
        /// No vote exists for the key.
        NotVoted { chapter_id: i64 } =>
            "no vote exists for chapter {chapter_id}",
        /// The chapter does not exist.
        UnknownChapter { chapter_id: i64 } =>
            "chapter {chapter_id} does not exist",
        /// The voter is not a provisioned user.
        UnknownUser { user_id: String } =>
            "user {user_id} does not exist",
    }
}

/// Port for casting, retracting and counting votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Store a new vote.
    ///
    /// Fails with [`VoteRepositoryError::AlreadyVoted`] when the key is taken,
    /// [`VoteRepositoryError::UnknownChapter`] when the chapter is absent and
    /// [`VoteRepositoryError::UnknownUser`] when the voter is.
    async fn insert_vote(&self, vote: &Vote) -> Result<(), VoteRepositoryError>;

    /// Remove the vote for `key`.
    ///
    /// Fails with [`VoteRepositoryError::NotVoted`] when no vote exists.
    async fn delete_vote(&self, key: &VoteKey) -> Result<(), VoteRepositoryError>;

    /// Fetch the vote for `key`, if any.
    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VoteRepositoryError>;

    /// Count votes on a chapter.
    async fn count_for_chapter(&self, chapter_id: ChapterId) -> Result<u64, VoteRepositoryError>;

    /// Count votes across every chapter of a story in one statement.
    async fn count_for_story(&self, story_id: StoryId) -> Result<u64, VoteRepositoryError>;
}
