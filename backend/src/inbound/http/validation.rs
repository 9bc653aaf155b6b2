//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure becomes `invalid_request` with
//! `details = {field, value?, code}` so clients can point at the offending
//! input.

use std::str::FromStr;

use pagination::Cursor;
use serde_json::json;

use crate::domain::{
    ChapterId, Error, HistoryCursorKey, StoryId, StoryStatus, TOP_STORIES_MAX_LIMIT,
    TopStoriesQuery,
};

/// Default number of stories in a ranking.
pub(crate) const TOP_STORIES_DEFAULT_LIMIT: usize = 10;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidId,
    InvalidStatus,
    InvalidLimit,
    InvalidCursor,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidId => "invalid_id",
            Self::InvalidStatus => "invalid_status",
            Self::InvalidLimit => "invalid_limit",
            Self::InvalidCursor => "invalid_cursor",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: FieldName,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field.as_str(),
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<serde_json::Value>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field.as_str(),
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("missing required field: {name}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn parse_story_id(raw: i64, field: FieldName) -> Result<StoryId, Error> {
    StoryId::new(raw).map_err(|err| {
        ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidId, raw)
    })
}

pub(crate) fn parse_chapter_id(raw: i64, field: FieldName) -> Result<ChapterId, Error> {
    ChapterId::new(raw).map_err(|err| {
        ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidId, raw)
    })
}

/// Parse an optional status filter; rankings default to published stories.
pub(crate) fn parse_status(raw: Option<&str>, field: FieldName) -> Result<StoryStatus, Error> {
    match raw {
        None => Ok(StoryStatus::Published),
        Some(value) => StoryStatus::from_str(value).map_err(|err| {
            ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidStatus, value)
        }),
    }
}

/// Build a ranking query, rejecting limits outside `1..=100`.
pub(crate) fn parse_top_stories_query(
    limit: Option<usize>,
    status: Option<&str>,
) -> Result<TopStoriesQuery, Error> {
    let status = parse_status(status, FieldName::new("status"))?;
    let limit = limit.unwrap_or(TOP_STORIES_DEFAULT_LIMIT);
    TopStoriesQuery::new(limit, status).map_err(|err| {
        ValidationError::new(FieldName::new("limit"), err.to_string()).with_value(
            ErrorCode::InvalidLimit,
            json!({"requested": limit, "max": TOP_STORIES_MAX_LIMIT}),
        )
    })
}

/// Decode an opaque history cursor.
pub(crate) fn parse_history_cursor(
    token: Option<&str>,
    field: FieldName,
) -> Result<Option<HistoryCursorKey>, Error> {
    token
        .map(|raw| {
            Cursor::<HistoryCursorKey>::decode(raw)
                .map(Cursor::into_inner)
                .map_err(|err| {
                    ValidationError::new(field, err.to_string())
                        .with_value(ErrorCode::InvalidCursor, raw)
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn detail<'a>(err: &'a Error, key: &str) -> Option<&'a serde_json::Value> {
        err.details().and_then(|details| details.get(key))
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn non_positive_ids_are_rejected(#[case] raw: i64) {
        let err = parse_chapter_id(raw, FieldName::new("chapterId")).expect_err("invalid id");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_id")));
        assert_eq!(detail(&err, "field"), Some(&json!("chapterId")));
        assert_eq!(detail(&err, "value"), Some(&json!(raw)));

        assert!(parse_story_id(raw, FieldName::new("storyId")).is_err());
    }

    #[rstest]
    #[case(None, StoryStatus::Published)]
    #[case(Some("draft"), StoryStatus::Draft)]
    #[case(Some("PUBLISHED"), StoryStatus::Published)]
    fn status_defaults_to_published(#[case] raw: Option<&str>, #[case] expected: StoryStatus) {
        assert_eq!(
            parse_status(raw, FieldName::new("status")).expect("valid status"),
            expected
        );
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let err = parse_status(Some("archived"), FieldName::new("status")).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_status")));
    }

    #[rstest]
    #[case(None, TOP_STORIES_DEFAULT_LIMIT)]
    #[case(Some(1), 1)]
    #[case(Some(TOP_STORIES_MAX_LIMIT), TOP_STORIES_MAX_LIMIT)]
    fn ranking_limits_within_range_are_accepted(
        #[case] limit: Option<usize>,
        #[case] expected: usize,
    ) {
        let query = parse_top_stories_query(limit, None).expect("valid query");
        assert_eq!(query.limit(), expected);
        assert_eq!(query.status(), StoryStatus::Published);
    }

    #[rstest]
    #[case(0)]
    #[case(TOP_STORIES_MAX_LIMIT + 1)]
    fn ranking_limits_out_of_range_are_rejected(#[case] limit: usize) {
        let err = parse_top_stories_query(Some(limit), None).expect_err("invalid limit");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_limit")));
    }

    #[rstest]
    fn history_cursor_decodes_encoded_keys() {
        let key = HistoryCursorKey {
            updated_at: Utc
                .with_ymd_and_hms(2026, 2, 1, 12, 0, 0)
                .single()
                .expect("timestamp"),
            story_id: StoryId::new(9).expect("story id"),
        };
        let token = Cursor::new(key).encode().expect("encode");

        let decoded =
            parse_history_cursor(Some(&token), FieldName::new("cursor")).expect("decodes");
        assert_eq!(decoded, Some(key));
        assert_eq!(
            parse_history_cursor(None, FieldName::new("cursor")).expect("absent"),
            None
        );
    }

    #[rstest]
    #[case("not base64!")]
    #[case("eyJmb28iOjF9")]
    fn malformed_history_cursors_are_rejected(#[case] token: &str) {
        let err =
            parse_history_cursor(Some(token), FieldName::new("cursor")).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_cursor")));
    }
}
