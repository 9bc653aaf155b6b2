//! Query-string page parameters.

use serde::Deserialize;

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: usize = 12;

/// Largest page size a client may request.
pub const MAX_LIMIT: usize = 100;

/// Cursor and page size supplied by a client.
///
/// A missing or zero limit falls back to [`DEFAULT_LIMIT`]; larger values are
/// capped at [`MAX_LIMIT`].
///
/// # Examples
/// ```
/// use pagination::{PageParams, MAX_LIMIT};
///
/// let params = PageParams::new(None, Some(1_000));
/// assert_eq!(params.limit(), MAX_LIMIT);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    cursor: Option<String>,
    limit: Option<usize>,
}

impl PageParams {
    /// Build parameters from raw values.
    pub const fn new(cursor: Option<String>, limit: Option<usize>) -> Self {
        Self { cursor, limit }
    }

    /// Opaque cursor token, if the client is continuing a walk.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|token| !token.trim().is_empty())
    }

    /// Effective page size.
    pub fn limit(&self) -> usize {
        match self.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(requested) => requested.min(MAX_LIMIT),
        }
    }
}
