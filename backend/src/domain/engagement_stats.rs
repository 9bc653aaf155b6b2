//! Aggregation read models.
//!
//! Every count here is derived from ledger rows at query time and never
//! stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ChapterId, StoryId, UserId};

/// Largest number of stories a ranking may return.
pub const TOP_STORIES_MAX_LIMIT: usize = 100;

/// Publication status of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    /// Visible only to its author.
    Draft,
    /// Visible to readers.
    Published,
}

impl StoryStatus {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("story status must be draft or published, got {0:?}")]
pub struct StoryStatusParseError(pub String);

impl FromStr for StoryStatus {
    type Err = StoryStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(StoryStatusParseError(s.to_owned())),
        }
    }
}

/// Catalogue fields shown alongside aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    /// Story id.
    pub id: StoryId,
    /// Author of the story.
    pub author_id: UserId,
    /// Story title.
    pub title: String,
    /// Cover image URL.
    pub cover_url: Option<String>,
    /// Publication status.
    pub status: StoryStatus,
}

/// A row of the vote ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStory {
    /// Story details.
    pub story: StorySummary,
    /// Chapters in the story.
    pub chapter_count: u64,
    /// Votes across all chapters of the story.
    pub vote_count: u64,
}

/// Aggregate engagement of one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEngagement {
    /// Story details.
    pub story: StorySummary,
    /// Chapters in the story.
    pub chapter_count: u64,
    /// Votes across all chapters of the story.
    pub vote_count: u64,
    /// Recorded read events.
    pub read_count: u64,
    /// Distinct users with at least one read event.
    pub reader_count: u64,
}

/// Votes received by one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterVotes {
    /// Chapter id.
    pub chapter_id: ChapterId,
    /// Position within the story.
    pub chapter_order: i32,
    /// Chapter title.
    pub title: String,
    /// Votes on the chapter.
    pub vote_count: u64,
}

/// Validation errors for [`TopStoriesQuery`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopStoriesQueryError {
    /// The limit was zero or above [`TOP_STORIES_MAX_LIMIT`].
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange {
        /// Requested limit.
        limit: usize,
        /// Upper bound.
        max: usize,
    },
}

/// Parameters of a vote ranking: at most `limit` stories with `status`.
///
/// # Examples
/// ```
/// use engagement_ledger::domain::{StoryStatus, TopStoriesQuery};
///
/// let query = TopStoriesQuery::new(5, StoryStatus::Published).expect("valid query");
/// assert_eq!(query.limit(), 5);
/// assert!(TopStoriesQuery::new(0, StoryStatus::Published).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopStoriesQuery {
    limit: usize,
    status: StoryStatus,
}

impl TopStoriesQuery {
    /// Validate ranking parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TopStoriesQueryError::LimitOutOfRange`] for a zero limit or
    /// one above [`TOP_STORIES_MAX_LIMIT`].
    pub const fn new(limit: usize, status: StoryStatus) -> Result<Self, TopStoriesQueryError> {
        if limit == 0 || limit > TOP_STORIES_MAX_LIMIT {
            return Err(TopStoriesQueryError::LimitOutOfRange {
                limit,
                max: TOP_STORIES_MAX_LIMIT,
            });
        }
        Ok(Self { limit, status })
    }

    /// Maximum number of stories to return.
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Status the stories must have.
    pub const fn status(&self) -> StoryStatus {
        self.status
    }
}

/// Order ranking rows by votes descending, then story id ascending.
pub fn rank_by_votes(stories: &mut [TopStory]) {
    stories.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| a.story.id.cmp(&b.story.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn top(id: i64, votes: u64) -> TopStory {
        TopStory {
            story: StorySummary {
                id: StoryId::new(id).expect("story id"),
                author_id: UserId::random(),
                title: format!("Story {id}"),
                cover_url: None,
                status: StoryStatus::Published,
            },
            chapter_count: 1,
            vote_count: votes,
        }
    }

    #[rstest]
    #[case("draft", StoryStatus::Draft)]
    #[case("Published", StoryStatus::Published)]
    #[case(" published ", StoryStatus::Published)]
    fn parses_status(#[case] raw: &str, #[case] expected: StoryStatus) {
        assert_eq!(raw.parse::<StoryStatus>().expect("status"), expected);
    }

    #[rstest]
    fn rejects_unknown_status() {
        assert!("archived".parse::<StoryStatus>().is_err());
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(TOP_STORIES_MAX_LIMIT, true)]
    #[case(TOP_STORIES_MAX_LIMIT + 1, false)]
    fn validates_limit(#[case] limit: usize, #[case] valid: bool) {
        assert_eq!(TopStoriesQuery::new(limit, StoryStatus::Draft).is_ok(), valid);
    }

    #[rstest]
    fn ranking_breaks_ties_by_ascending_id() {
        let mut rows = vec![top(9, 2), top(4, 5), top(2, 2), top(7, 5)];
        rank_by_votes(&mut rows);

        let order: Vec<(i64, u64)> = rows
            .iter()
            .map(|row| (row.story.id.get(), row.vote_count))
            .collect();
        assert_eq!(order, vec![(4, 5), (7, 5), (2, 2), (9, 2)]);
    }
}
