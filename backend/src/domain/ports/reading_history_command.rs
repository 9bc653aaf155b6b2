//! Driving port for recording reads.

use async_trait::async_trait;

use crate::domain::{ChapterId, Error, ReadingHistoryEntry, ReadingKey};

/// A user reached a chapter of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReadRequest {
    /// Reader and story.
    pub key: ReadingKey,
    /// Chapter reached.
    pub chapter_id: ChapterId,
}

/// Use-case port for updating reading positions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingHistoryCommand: Send + Sync {
    /// Record the read and return the stored entry.
    async fn record_read(&self, request: RecordReadRequest) -> Result<ReadingHistoryEntry, Error>;
}
