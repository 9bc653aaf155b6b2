//! Driving port for reading-history lookups.
//!
//! For a lazily fetched, restartable sequence over every page see
//! [`walk_history`](crate::domain::walk_history), which drives this port.

use async_trait::async_trait;

use crate::domain::{Error, HistoryPage, HistoryPageRequest, ReadingHistoryItem, ReadingKey};

/// Use-case port for reading positions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingHistoryQuery: Send + Sync {
    /// One page of a user's history, newest first.
    async fn history_page(&self, request: &HistoryPageRequest) -> Result<HistoryPage, Error>;

    /// The entry for one story.
    ///
    /// Fails with not found (`details.code = "reading_history_not_found"`)
    /// when the user has never read the story.
    async fn entry(&self, key: &ReadingKey) -> Result<ReadingHistoryItem, Error>;
}
