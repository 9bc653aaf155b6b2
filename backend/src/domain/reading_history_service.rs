//! Reading history domain service.
//!
//! Records reads through a single repository upsert. If the upsert loses a
//! race on the uniqueness constraint the read is retried exactly once as an
//! update, which never produces a second entry for the same user and story.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound as _;
use mockable::Clock;
use serde_json::json;
use tracing::warn;

use crate::domain::ports::{
    ReadingHistoryCommand, ReadingHistoryQuery, ReadingHistoryRepository,
    ReadingHistoryRepositoryError, RecordReadRequest,
};
use crate::domain::{
    Error, HistoryPage, HistoryPageRequest, ReadPosition, ReadingHistoryEntry, ReadingHistoryItem,
    ReadingKey,
};

/// Largest page a single history request may return.
pub const HISTORY_PAGE_MAX_LIMIT: usize = 100;

fn map_history_error(error: ReadingHistoryRepositoryError) -> Error {
    match error {
        ReadingHistoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("reading history unavailable: {message}"))
        }
        ReadingHistoryRepositoryError::Query { message } => {
            Error::internal(format!("reading history error: {message}"))
        }
        ReadingHistoryRepositoryError::ConstraintViolation { message } => {
            Error::conflict("reading history entry changed concurrently").with_details(json!({
                "code": "constraint_violation",
                "reason": message,
            }))
        }
        ReadingHistoryRepositoryError::UnknownStory { story_id } => {
            Error::not_found(format!("story {story_id} not found")).with_details(json!({
                "code": "story_not_found",
                "storyId": story_id,
            }))
        }
        ReadingHistoryRepositoryError::ChapterNotInStory {
            story_id,
            chapter_id,
        } => Error::invalid_request(format!(
            "chapter {chapter_id} does not belong to story {story_id}"
        ))
        .with_details(json!({
            "code": "chapter_not_in_story",
            "storyId": story_id,
            "chapterId": chapter_id,
        })),
        ReadingHistoryRepositoryError::UnknownUser { user_id } => {
            Error::not_found("user is not provisioned").with_details(json!({
                "code": "user_not_found",
                "userId": user_id,
            }))
        }
    }
}

/// Reading history service implementing the history driving ports.
#[derive(Clone)]
pub struct ReadingHistoryService<R> {
    history_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ReadingHistoryService<R> {
    /// Create a service timestamping reads with `clock`.
    pub fn new(history_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            history_repo,
            clock,
        }
    }
}

impl<R> ReadingHistoryService<R>
where
    R: ReadingHistoryRepository,
{
    async fn retry_as_update(&self, position: &ReadPosition) -> Result<ReadingHistoryEntry, Error> {
        self.history_repo
            .overwrite_entry(position)
            .await
            .map_err(map_history_error)?
            .ok_or_else(|| {
                Error::conflict("reading history entry vanished during update").with_details(
                    json!({
                        "code": "constraint_violation",
                        "storyId": position.key.story_id.get(),
                    }),
                )
            })
    }
}

#[async_trait]
impl<R> ReadingHistoryCommand for ReadingHistoryService<R>
where
    R: ReadingHistoryRepository,
{
    async fn record_read(&self, request: RecordReadRequest) -> Result<ReadingHistoryEntry, Error> {
        let position = ReadPosition {
            key: request.key,
            chapter_id: request.chapter_id,
            read_at: self.clock.utc().trunc_subsecs(6),
        };
        match self.history_repo.upsert_entry(&position).await {
            Ok(entry) => Ok(entry),
            Err(ReadingHistoryRepositoryError::ConstraintViolation { message }) => {
                warn!(
                    key = %position.key,
                    reason = %message,
                    "reading history upsert collided; retrying as update"
                );
                self.retry_as_update(&position).await
            }
            Err(error) => Err(map_history_error(error)),
        }
    }
}

#[async_trait]
impl<R> ReadingHistoryQuery for ReadingHistoryService<R>
where
    R: ReadingHistoryRepository,
{
    async fn history_page(&self, request: &HistoryPageRequest) -> Result<HistoryPage, Error> {
        let limit = request.limit.clamp(1, HISTORY_PAGE_MAX_LIMIT);
        let items = self
            .history_repo
            .list_for_user(&request.user_id, request.after, limit + 1)
            .await
            .map_err(map_history_error)?;
        Ok(HistoryPage::from_probe(items, limit))
    }

    async fn entry(&self, key: &ReadingKey) -> Result<ReadingHistoryItem, Error> {
        self.history_repo
            .find_entry(key)
            .await
            .map_err(map_history_error)?
            .ok_or_else(|| {
                Error::not_found(format!("no reading history for {key}")).with_details(json!({
                    "code": "reading_history_not_found",
                    "storyId": key.story_id.get(),
                }))
            })
    }
}

#[cfg(test)]
#[path = "reading_history_service_tests.rs"]
mod tests;
