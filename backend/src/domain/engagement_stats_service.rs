//! Aggregation service over the engagement ledger.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{
    EngagementStatsQuery, EngagementStatsRepository, EngagementStatsRepositoryError,
};
use crate::domain::{
    ChapterVotes, Error, StoryEngagement, StoryId, TopStoriesQuery, TopStory, rank_by_votes,
};

fn map_stats_error(error: EngagementStatsRepositoryError) -> Error {
    match error {
        EngagementStatsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("engagement stats unavailable: {message}"))
        }
        EngagementStatsRepositoryError::Query { message } => {
            Error::internal(format!("engagement stats error: {message}"))
        }
    }
}

/// Service implementing [`EngagementStatsQuery`].
#[derive(Clone)]
pub struct EngagementStatsService<R> {
    stats_repo: Arc<R>,
}

impl<R> EngagementStatsService<R> {
    /// Create a stats service backed by `stats_repo`.
    pub fn new(stats_repo: Arc<R>) -> Self {
        Self { stats_repo }
    }
}

#[async_trait]
impl<R> EngagementStatsQuery for EngagementStatsService<R>
where
    R: EngagementStatsRepository,
{
    async fn chapter_count(&self, story_id: StoryId) -> Result<u64, Error> {
        self.stats_repo
            .chapter_count(story_id)
            .await
            .map_err(map_stats_error)
    }

    async fn story_engagement(&self, story_id: StoryId) -> Result<StoryEngagement, Error> {
        self.stats_repo
            .story_engagement(story_id)
            .await
            .map_err(map_stats_error)?
            .ok_or_else(|| {
                Error::not_found(format!("story {story_id} not found")).with_details(json!({
                    "code": "story_not_found",
                    "storyId": story_id.get(),
                }))
            })
    }

    async fn top_stories_by_votes(&self, query: &TopStoriesQuery) -> Result<Vec<TopStory>, Error> {
        let mut stories = self
            .stats_repo
            .top_stories(query)
            .await
            .map_err(map_stats_error)?;
        stories.retain(|top| top.story.status == query.status());
        // Adapters may return rows in any order.
        rank_by_votes(&mut stories);
        stories.truncate(query.limit());
        Ok(stories)
    }

    async fn chapter_vote_breakdown(&self, story_id: StoryId) -> Result<Vec<ChapterVotes>, Error> {
        self.stats_repo
            .chapter_vote_breakdown(story_id)
            .await
            .map_err(map_stats_error)
    }
}
