//! Reading history entities and the lazy history walk.
//!
//! A [`ReadingHistoryEntry`] records the last chapter a user read in a story.
//! Listing joins the entry with catalogue details into a
//! [`ReadingHistoryItem`]. Lists are ordered by `updated_at` descending with
//! the story id as a descending tie-breaker, and page boundaries are
//! expressed as a [`HistoryCursorKey`].

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};

use super::ports::ReadingHistoryQuery;
use super::{ChapterId, Error, ReadingKey, StoryId, StoryStatus, UserId};

/// Last-read position of a user within a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryEntry {
    /// Reader and story.
    pub key: ReadingKey,
    /// Last chapter read. Cleared if the chapter is later deleted.
    pub last_chapter_id: Option<ChapterId>,
    /// Time of the most recent recorded read.
    pub updated_at: DateTime<Utc>,
}

/// A read to record: the reader reached `chapter_id` at `read_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPosition {
    /// Reader and story.
    pub key: ReadingKey,
    /// Chapter reached.
    pub chapter_id: ChapterId,
    /// Time of the read.
    pub read_at: DateTime<Utc>,
}

impl ReadPosition {
    /// The entry this position produces when it wins.
    pub const fn to_entry(&self) -> ReadingHistoryEntry {
        ReadingHistoryEntry {
            key: self.key,
            last_chapter_id: Some(self.chapter_id),
            updated_at: self.read_at,
        }
    }
}

/// Reading history entry joined with story and chapter details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryItem {
    /// The underlying entry.
    pub entry: ReadingHistoryEntry,
    /// Story title.
    pub story_title: String,
    /// Story cover image, if any.
    pub story_cover_url: Option<String>,
    /// Publication status of the story.
    pub story_status: StoryStatus,
    /// Title of the last chapter read.
    pub last_chapter_title: Option<String>,
    /// Position of the last chapter read within the story.
    pub last_chapter_order: Option<i32>,
}

impl ReadingHistoryItem {
    /// Position of this item in the history ordering.
    pub const fn cursor_key(&self) -> HistoryCursorKey {
        HistoryCursorKey {
            updated_at: self.entry.updated_at,
            story_id: self.entry.key.story_id,
        }
    }
}

/// Ordering key of a history item; pages resume strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCursorKey {
    /// `updated_at` of the last item returned.
    pub updated_at: DateTime<Utc>,
    /// Story id of the last item returned.
    pub story_id: StoryId,
}

impl HistoryCursorKey {
    /// Whether an item keyed `(updated_at, story_id)` belongs on a page
    /// resumed from this key.
    pub fn admits(&self, updated_at: DateTime<Utc>, story_id: StoryId) -> bool {
        (updated_at, story_id) < (self.updated_at, self.story_id)
    }
}

/// Request for one page of a user's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPageRequest {
    /// Whose history to list.
    pub user_id: UserId,
    /// Resume strictly after this key; `None` starts from the newest entry.
    pub after: Option<HistoryCursorKey>,
    /// Maximum number of items to return.
    pub limit: usize,
}

/// One page of reading history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Items, newest first.
    pub items: Vec<ReadingHistoryItem>,
    /// Key to resume from, present when more items may follow.
    pub next: Option<HistoryCursorKey>,
}

impl HistoryPage {
    /// Build a page from up to `limit + 1` fetched items.
    ///
    /// The extra item, when present, only signals that another page exists
    /// and is dropped.
    pub fn from_probe(mut items: Vec<ReadingHistoryItem>, limit: usize) -> Self {
        let has_more = items.len() > limit;
        items.truncate(limit);
        let next = if has_more {
            items.last().map(ReadingHistoryItem::cursor_key)
        } else {
            None
        };
        Self { items, next }
    }
}

/// Lazily walk a user's history, fetching one page at a time.
///
/// Nothing is fetched until the stream is polled. Passing a previously seen
/// [`HistoryCursorKey`] as `from` restarts the walk after that item. The
/// stream ends after the first error.
pub fn walk_history<'a, Q>(
    query: &'a Q,
    user_id: UserId,
    from: Option<HistoryCursorKey>,
    page_size: usize,
) -> impl Stream<Item = Result<ReadingHistoryItem, Error>> + Send + 'a
where
    Q: ReadingHistoryQuery + ?Sized,
{
    let limit = page_size.max(1);
    stream::try_unfold(Some(from), move |state| async move {
        let Some(after) = state else {
            return Ok::<_, Error>(None);
        };
        let page = query
            .history_page(&HistoryPageRequest {
                user_id,
                after,
                limit,
            })
            .await?;
        let next_state = page.next.map(Some);
        Ok(Some((
            stream::iter(page.items.into_iter().map(Ok::<_, Error>)),
            next_state,
        )))
    })
    .try_flatten()
}
