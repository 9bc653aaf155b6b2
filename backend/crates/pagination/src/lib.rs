//! Opaque cursor and pagination envelope primitives.
//!
//! Endpoints that expose keyset-paginated collections share three pieces:
//! an opaque [`Cursor`] wrapping the last-seen ordering key, [`PageParams`]
//! parsed from the query string, and the [`Paginated`] response envelope with
//! navigation links.

mod cursor;
mod envelope;
mod params;

pub use cursor::{Cursor, CursorError};
pub use envelope::{Paginated, PaginationLinks};
pub use params::{DEFAULT_LIMIT, MAX_LIMIT, PageParams};
