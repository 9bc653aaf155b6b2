//! PostgreSQL-backed `EngagementStatsRepository` implementation.
//!
//! Every count is computed from live rows in one statement. Nothing is
//! cached, so counts always match the ledger at statement time.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Varchar};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EngagementStatsRepository, EngagementStatsRepositoryError};
use crate::domain::{ChapterVotes, StoryEngagement, StoryId, TopStoriesQuery, TopStory};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, count_to_u64};
use super::models::{ChapterVotesRow, StoryEngagementRow, TopStoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::chapters;

const STORY_ENGAGEMENT_SQL: &str = "\
SELECT s.id, s.author_id, s.title, s.cover_url, s.status, \
    (SELECT COUNT(*) FROM chapters c WHERE c.story_id = s.id) AS chapter_count, \
    (SELECT COUNT(*) FROM votes v JOIN chapters c ON c.id = v.chapter_id \
        WHERE c.story_id = s.id) AS vote_count, \
    (SELECT COUNT(*) FROM story_reads r WHERE r.story_id = s.id) AS read_count, \
    (SELECT COUNT(DISTINCT r.user_id) FROM story_reads r \
        WHERE r.story_id = s.id) AS reader_count \
FROM stories s \
WHERE s.id = $1";

const TOP_STORIES_SQL: &str = "\
SELECT s.id, s.author_id, s.title, s.cover_url, s.status, \
    (SELECT COUNT(*) FROM chapters c WHERE c.story_id = s.id) AS chapter_count, \
    (SELECT COUNT(*) FROM votes v JOIN chapters c ON c.id = v.chapter_id \
        WHERE c.story_id = s.id) AS vote_count \
FROM stories s \
WHERE s.status = $1 \
ORDER BY vote_count DESC, s.id ASC \
LIMIT $2";

const CHAPTER_VOTES_SQL: &str = "\
SELECT c.id AS chapter_id, c.chapter_order, c.title, COUNT(v.user_id) AS vote_count \
FROM chapters c \
LEFT JOIN votes v ON v.chapter_id = c.id \
WHERE c.story_id = $1 \
GROUP BY c.id, c.chapter_order, c.title \
ORDER BY c.chapter_order ASC";

/// Diesel-backed implementation of the [`EngagementStatsRepository`] port.
#[derive(Clone)]
pub struct DieselEngagementStatsRepository {
    pool: DbPool,
}

impl DieselEngagementStatsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EngagementStatsRepositoryError {
    EngagementStatsRepositoryError::connection(error.into_message())
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
) -> EngagementStatsRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection { message } => EngagementStatsRepositoryError::connection(message),
        DieselFailure::Query { message } => EngagementStatsRepositoryError::query(message),
        other => EngagementStatsRepositoryError::query(format!("{other:?}")),
    }
}

#[async_trait]
impl EngagementStatsRepository for DieselEngagementStatsRepository {
    async fn chapter_count(&self, story_id: StoryId) -> Result<u64, EngagementStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = chapters::table
            .filter(chapters::story_id.eq(story_id.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "count chapters"))?;

        Ok(count_to_u64(count))
    }

    async fn story_engagement(
        &self,
        story_id: StoryId,
    ) -> Result<Option<StoryEngagement>, EngagementStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StoryEngagementRow> = sql_query(STORY_ENGAGEMENT_SQL)
            .bind::<BigInt, _>(story_id.get())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "story engagement"))?;

        row.map(StoryEngagementRow::into_engagement)
            .transpose()
            .map_err(EngagementStatsRepositoryError::query)
    }

    async fn top_stories(
        &self,
        query: &TopStoriesQuery,
    ) -> Result<Vec<TopStory>, EngagementStatsRepositoryError> {
        let limit = i64::try_from(query.limit()).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TopStoryRow> = sql_query(TOP_STORIES_SQL)
            .bind::<Varchar, _>(query.status().as_str())
            .bind::<BigInt, _>(limit)
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "top stories"))?;

        rows.into_iter()
            .map(TopStoryRow::into_top_story)
            .collect::<Result<Vec<_>, _>>()
            .map_err(EngagementStatsRepositoryError::query)
    }

    async fn chapter_vote_breakdown(
        &self,
        story_id: StoryId,
    ) -> Result<Vec<ChapterVotes>, EngagementStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ChapterVotesRow> = sql_query(CHAPTER_VOTES_SQL)
            .bind::<BigInt, _>(story_id.get())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "chapter vote breakdown"))?;

        rows.into_iter()
            .map(ChapterVotesRow::into_chapter_votes)
            .collect::<Result<Vec<_>, _>>()
            .map_err(EngagementStatsRepositoryError::query)
    }
}
