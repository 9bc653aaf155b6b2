//! Identity keys.
//!
//! Users are identified by UUIDs issued by the platform's account service;
//! stories and chapters by positive 64-bit integers issued by the catalogue.
//! [`VoteKey`] and [`ReadingKey`] are the composite keys on which the ledger
//! enforces at-most-one semantics.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    /// The user id was empty.
    #[error("user id must not be empty")]
    EmptyUserId,
    /// The user id was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    InvalidUserId,
    /// A story or chapter id was zero or negative.
    #[error("{kind} id must be a positive integer, got {value}")]
    NonPositive {
        /// Which identifier failed.
        kind: &'static str,
        /// The rejected value.
        value: i64,
    },
}

/// Stable user identifier.
///
/// # Examples
/// ```
/// use engagement_ledger::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a user id from its textual form.
    ///
    /// # Errors
    ///
    /// Rejects empty input, surrounding whitespace, and non-UUID text.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(IdentityValidationError::EmptyUserId);
        }
        if raw.trim() != raw {
            return Err(IdentityValidationError::InvalidUserId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| IdentityValidationError::InvalidUserId)
    }

    /// Generate a random user id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read from storage.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

macro_rules! catalogue_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Validate a raw identifier.
            ///
            /// # Errors
            ///
            /// Returns [`IdentityValidationError::NonPositive`] for zero or
            /// negative values.
            pub const fn new(value: i64) -> Result<Self, IdentityValidationError> {
                if value <= 0 {
                    return Err(IdentityValidationError::NonPositive { kind: $kind, value });
                }
                Ok(Self(value))
            }

            /// Raw integer value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdentityValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

catalogue_id!(
    /// Identifier of a story in the catalogue.
    StoryId,
    "story"
);

catalogue_id!(
    /// Identifier of a chapter in the catalogue.
    ChapterId,
    "chapter"
);

/// Key of a vote: one user, one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteKey {
    /// The voter.
    pub user_id: UserId,
    /// The chapter voted on.
    pub chapter_id: ChapterId,
}

impl VoteKey {
    /// Pair a user with a chapter.
    pub const fn new(user_id: UserId, chapter_id: ChapterId) -> Self {
        Self {
            user_id,
            chapter_id,
        }
    }
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/chapter:{}", self.user_id, self.chapter_id)
    }
}

/// Key of a reading-history entry: one user, one story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingKey {
    /// The reader.
    pub user_id: UserId,
    /// The story being read.
    pub story_id: StoryId,
}

impl ReadingKey {
    /// Pair a user with a story.
    pub const fn new(user_id: UserId, story_id: StoryId) -> Self {
        Self { user_id, story_id }
    }
}

impl fmt::Display for ReadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/story:{}", self.user_id, self.story_id)
    }
}
