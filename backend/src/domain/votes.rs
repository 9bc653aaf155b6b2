//! Vote ledger entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VoteKey;

/// A user's vote on a chapter.
///
/// Votes are created on cast and removed on retract; they are never edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Who voted on which chapter.
    pub key: VoteKey,
    /// When the vote was cast.
    pub voted_at: DateTime<Utc>,
}

impl Vote {
    /// Build a vote cast at `voted_at`.
    pub const fn new(key: VoteKey, voted_at: DateTime<Utc>) -> Self {
        Self { key, voted_at }
    }
}
