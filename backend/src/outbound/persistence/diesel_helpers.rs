//! Shared helpers for the Diesel ledger adapters.
//!
//! Diesel errors are first classified into a [`DieselFailure`], which each
//! adapter then maps onto its own port error. Constraint names come from the
//! migrations and are matched exactly.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Primary key of `votes`.
pub(crate) const VOTES_PKEY: &str = "votes_pkey";
/// `votes.chapter_id` foreign key.
pub(crate) const VOTES_CHAPTER_FKEY: &str = "votes_chapter_id_fkey";
/// One reading-history row per user and story.
pub(crate) const READING_HISTORY_USER_STORY_KEY: &str = "reading_history_user_story_key";
/// `reading_history.story_id` foreign key.
pub(crate) const READING_HISTORY_STORY_FKEY: &str = "reading_history_story_id_fkey";
/// Composite foreign key tying the last chapter to the entry's story.
pub(crate) const READING_HISTORY_CHAPTER_STORY_FKEY: &str = "reading_history_chapter_story_fkey";

/// `votes.user_id` foreign key.
pub(crate) const VOTES_USER_FKEY: &str = "votes_user_id_fkey";
/// `reading_history.user_id` foreign key.
pub(crate) const READING_HISTORY_USER_FKEY: &str = "reading_history_user_id_fkey";
/// `story_reads.user_id` foreign key.
pub(crate) const STORY_READS_USER_FKEY: &str = "story_reads_user_id_fkey";

/// Message prefix PostgreSQL uses for cancelled statements (SQLSTATE 57014)
/// and lock timeouts (55P03).
const CANCELED_STATEMENT_PREFIX: &str = "canceling statement due to";

/// Storage failure reduced to what the ledger adapters distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// A unique or primary key constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
    /// The connection dropped or the transaction manager is unusable.
    Connection { message: String },
    /// Any other failure.
    Query { message: String },
}

impl DieselFailure {
    /// Whether this is a unique violation on `constraint`.
    ///
    /// A violation without a reported constraint name matches any name.
    pub(crate) fn is_unique_on(&self, constraint: &str) -> bool {
        matches!(
            self,
            Self::UniqueViolation { constraint: name }
                if name.as_deref().is_none_or(|name| name == constraint)
        )
    }

    /// Whether this is a foreign key violation on `constraint`.
    pub(crate) fn is_foreign_key_on(&self, constraint: &str) -> bool {
        matches!(
            self,
            Self::ForeignKeyViolation { constraint: Some(name) } if name == constraint
        )
    }
}

/// Classify a Diesel error, logging it at debug level.
pub(crate) fn classify_diesel_error(error: DieselError, operation: &'static str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                operation,
                "diesel operation failed"
            );
        }
        _ => debug!(%error, operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection {
                message: "database connection closed".to_owned(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::UnableToSendCommand, info) => {
            DieselFailure::Connection {
                message: info.message().to_owned(),
            }
        }
        DieselError::DatabaseError(_, info)
            if info.message().starts_with(CANCELED_STATEMENT_PREFIX) =>
        {
            DieselFailure::Connection {
                message: info.message().to_owned(),
            }
        }
        DieselError::BrokenTransactionManager => DieselFailure::Connection {
            message: "transaction manager is broken".to_owned(),
        },
        DieselError::NotFound => DieselFailure::Query {
            message: "record not found".to_owned(),
        },
        DieselError::QueryBuilderError(_) => DieselFailure::Query {
            message: "database query error".to_owned(),
        },
        DieselError::DatabaseError(_, info) => DieselFailure::Query {
            message: info.message().to_owned(),
        },
        other => DieselFailure::Query {
            message: other.to_string(),
        },
    }
}

/// Convert a SQL `COUNT(*)` to an unsigned count.
pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}
