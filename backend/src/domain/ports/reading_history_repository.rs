//! Driven port for reading-history storage.
//!
//! At most one entry exists per [`ReadingKey`]. Writes go through a single
//! atomic upsert keyed by that constraint, and each recorded read also
//! appends a read event in the same transaction.

use async_trait::async_trait;

use crate::domain::{
    HistoryCursorKey, ReadPosition, ReadingHistoryEntry, ReadingHistoryItem, ReadingKey, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reading-history repository adapters.
    pub enum ReadingHistoryRepositoryError {
        /// The store could not be reached or timed out.
        Connection { message: String } =>
            "reading history repository connection failed: {message}",
        /// A query failed during execution.
        Query { message: String } =>
            "reading history repository query failed: {message}",
        /// The upsert lost a race on the uniqueness constraint.
        ConstraintViolation { message: String } =>
            "reading history uniqueness constraint violated: {message}",
        /// The story does not exist.
        UnknownStory { story_id: i64 } =>
            "story {story_id} does not exist",
        /// The chapter does not exist or belongs to another story.
        ChapterNotInStory { story_id: i64, chapter_id: i64 } =>
            "chapter {chapter_id} does not belong to story {story_id}",
        /// The reader is not a provisioned user.
        UnknownUser { user_id: String } =>
            "user {user_id} does not exist",
    }
}

/// Port for recording and listing reading positions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingHistoryRepository: Send + Sync {
    /// Insert the entry for `position.key` or move it to `position`.
    ///
    /// An existing entry is only overwritten when `position.read_at` is not
    /// older than its `updated_at`; otherwise the stored entry is kept. In
    /// both cases the resulting stored entry is returned and a read event is
    /// appended.
    async fn upsert_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<ReadingHistoryEntry, ReadingHistoryRepositoryError>;

    /// Update an existing entry under the same rules as
    /// [`upsert_entry`](Self::upsert_entry) without attempting an insert.
    ///
    /// Returns `None` when no entry exists for the key.
    async fn overwrite_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<Option<ReadingHistoryEntry>, ReadingHistoryRepositoryError>;

    /// Fetch one entry joined with catalogue details.
    async fn find_entry(
        &self,
        key: &ReadingKey,
    ) -> Result<Option<ReadingHistoryItem>, ReadingHistoryRepositoryError>;

    /// List up to `limit` entries for a user, newest first, strictly after
    /// `after` when given.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        after: Option<HistoryCursorKey>,
        limit: usize,
    ) -> Result<Vec<ReadingHistoryItem>, ReadingHistoryRepositoryError>;
}
