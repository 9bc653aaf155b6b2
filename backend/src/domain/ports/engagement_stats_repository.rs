//! Driven port for derived engagement counts.

use async_trait::async_trait;

use crate::domain::{ChapterVotes, StoryEngagement, StoryId, TopStoriesQuery, TopStory};

use super::define_port_error;

define_port_error! {
    /// Errors raised by engagement statistics adapters.
    pub enum EngagementStatsRepositoryError {
        /// The store could not be reached or timed out.
        Connection { message: String } =>
            "engagement stats connection failed: {message}",
        /// A query failed during execution.
        Query { message: String } =>
            "engagement stats query failed: {message}",
    }
}

/// Port for aggregate queries over the ledger.
///
/// Every method computes its result from current rows within a single
/// statement or snapshot; nothing is cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStatsRepository: Send + Sync {
    /// Count chapters of a story.
    async fn chapter_count(&self, story_id: StoryId) -> Result<u64, EngagementStatsRepositoryError>;

    /// Summarise a story's engagement, or `None` if the story is unknown.
    async fn story_engagement(
        &self,
        story_id: StoryId,
    ) -> Result<Option<StoryEngagement>, EngagementStatsRepositoryError>;

    /// Rank stories with the requested status by votes descending, ties by
    /// ascending story id.
    async fn top_stories(
        &self,
        query: &TopStoriesQuery,
    ) -> Result<Vec<TopStory>, EngagementStatsRepositoryError>;

    /// Votes per chapter of a story, in chapter order.
    async fn chapter_vote_breakdown(
        &self,
        story_id: StoryId,
    ) -> Result<Vec<ChapterVotes>, EngagementStatsRepositoryError>;
}
