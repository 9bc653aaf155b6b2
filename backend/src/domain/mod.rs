//! Domain primitives, ledger entities and services.
//!
//! Purpose: Define strongly typed identities, the vote and reading-history
//! ledgers, and the aggregation read models. Keep types immutable and
//! document invariants and serialisation contracts (serde) in each type's
//! Rustdoc.
//!
//! Public surface:
//! - Identity keys: [`UserId`], [`StoryId`], [`ChapterId`], [`VoteKey`] and
//!   [`ReadingKey`].
//! - Ledger entities: [`Vote`], [`ReadingHistoryEntry`] and the read models in
//!   [`engagement_stats`].
//! - Services implementing the driving ports in [`ports`].
//! - [`Error`] and [`ErrorCode`] for transport-agnostic failures.

pub mod auth;
pub mod engagement_stats;
pub mod engagement_stats_service;
pub mod error;
pub mod ids;
pub mod ports;
pub mod reading_history;
pub mod reading_history_service;
pub mod trace_id;
pub mod vote_ledger_service;
pub mod votes;

pub use self::auth::{SessionClaims, is_expired};
pub use self::engagement_stats::{
    ChapterVotes, StoryEngagement, StoryStatus, StoryStatusParseError, StorySummary,
    TOP_STORIES_MAX_LIMIT, TopStoriesQuery, TopStoriesQueryError, TopStory, rank_by_votes,
};
pub use self::engagement_stats_service::EngagementStatsService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{ChapterId, IdentityValidationError, ReadingKey, StoryId, UserId, VoteKey};
pub use self::reading_history::{
    HistoryCursorKey, HistoryPage, HistoryPageRequest, ReadPosition, ReadingHistoryEntry,
    ReadingHistoryItem, walk_history,
};
pub use self::reading_history_service::{HISTORY_PAGE_MAX_LIMIT, ReadingHistoryService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::vote_ledger_service::VoteLedgerService;
pub use self::votes::Vote;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use engagement_ledger::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
