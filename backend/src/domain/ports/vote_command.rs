//! Driving port for vote mutations.

use async_trait::async_trait;

use crate::domain::{Error, Vote, VoteKey};

/// Use-case port for casting and retracting votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteCommand: Send + Sync {
    /// Cast a vote, returning it with its timestamp.
    ///
    /// Fails with a conflict (`details.code = "already_voted"`) when the user
    /// has already voted on the chapter.
    async fn cast_vote(&self, key: &VoteKey) -> Result<Vote, Error>;

    /// Retract a vote.
    ///
    /// Fails with not found (`details.code = "not_voted"`) when there is no
    /// vote to retract.
    async fn retract_vote(&self, key: &VoteKey) -> Result<(), Error>;
}
