//! Driving port for aggregate statistics.

use async_trait::async_trait;

use crate::domain::{ChapterVotes, Error, StoryEngagement, StoryId, TopStoriesQuery, TopStory};

/// Use-case port for derived counts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStatsQuery: Send + Sync {
    /// Chapters in a story.
    async fn chapter_count(&self, story_id: StoryId) -> Result<u64, Error>;

    /// Engagement summary of one story; not found for unknown stories.
    async fn story_engagement(&self, story_id: StoryId) -> Result<StoryEngagement, Error>;

    /// Stories ranked by votes.
    async fn top_stories_by_votes(&self, query: &TopStoriesQuery) -> Result<Vec<TopStory>, Error>;

    /// Votes per chapter of a story, in chapter order.
    async fn chapter_vote_breakdown(&self, story_id: StoryId) -> Result<Vec<ChapterVotes>, Error>;
}
