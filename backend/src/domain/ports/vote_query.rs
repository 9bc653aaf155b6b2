//! Driving port for vote lookups and counts.

use async_trait::async_trait;

use crate::domain::{ChapterId, Error, StoryId, VoteKey};

/// Use-case port for read-only vote operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteQuery: Send + Sync {
    /// Whether a vote exists for `key`.
    async fn has_voted(&self, key: &VoteKey) -> Result<bool, Error>;

    /// Votes on one chapter.
    async fn count_votes_for_chapter(&self, chapter_id: ChapterId) -> Result<u64, Error>;

    /// Votes across all chapters of a story.
    async fn count_votes_for_story(&self, story_id: StoryId) -> Result<u64, Error>;
}
