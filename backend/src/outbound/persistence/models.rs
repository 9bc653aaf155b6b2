//! Internal Diesel row structs for the ledger tables.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types return a `String` message on failure so each adapter can wrap it in
//! its own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text, Uuid as SqlUuid, Varchar};
use uuid::Uuid;

use crate::domain::{
    ChapterId, ChapterVotes, ReadingHistoryEntry, ReadingHistoryItem, ReadingKey, StoryEngagement,
    StoryId, StoryStatus, StorySummary, TopStory, UserId, Vote, VoteKey,
};

use super::diesel_helpers::count_to_u64;
use super::schema::{reading_history, story_reads, votes};

fn story_id(raw: i64) -> Result<StoryId, String> {
    StoryId::new(raw).map_err(|err| err.to_string())
}

fn chapter_id(raw: i64) -> Result<ChapterId, String> {
    ChapterId::new(raw).map_err(|err| err.to_string())
}

fn story_status(raw: &str) -> Result<StoryStatus, String> {
    raw.parse().map_err(|err: crate::domain::StoryStatusParseError| err.to_string())
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

/// Row struct for reading from and writing to the votes table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub user_id: Uuid,
    pub chapter_id: i64,
    pub created_at: DateTime<Utc>,
}

impl VoteRow {
    pub(crate) fn from_vote(vote: &Vote) -> Self {
        Self {
            user_id: *vote.key.user_id.as_uuid(),
            chapter_id: vote.key.chapter_id.get(),
            created_at: vote.voted_at,
        }
    }

    pub(crate) fn into_vote(self) -> Result<Vote, String> {
        let key = VoteKey::new(UserId::from_uuid(self.user_id), chapter_id(self.chapter_id)?);
        Ok(Vote::new(key, self.created_at))
    }
}

// ---------------------------------------------------------------------------
// Reading history
// ---------------------------------------------------------------------------

/// Row struct for reading from and upserting into reading_history.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = reading_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReadingHistoryRow {
    pub user_id: Uuid,
    pub story_id: i64,
    pub last_chapter_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingHistoryRow {
    pub(crate) fn into_entry(self) -> Result<ReadingHistoryEntry, String> {
        Ok(ReadingHistoryEntry {
            key: ReadingKey::new(UserId::from_uuid(self.user_id), story_id(self.story_id)?),
            last_chapter_id: self.last_chapter_id.map(chapter_id).transpose()?,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable read event.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = story_reads)]
pub(crate) struct NewStoryReadRow {
    pub user_id: Uuid,
    pub story_id: i64,
    pub chapter_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Reading history joined with its story and, when still present, the last
/// chapter: `(entry, story title, cover, status, chapter title, order)`.
pub(crate) type ReadingHistoryItemRow = (
    ReadingHistoryRow,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<i32>,
);

pub(crate) fn item_from_row(row: ReadingHistoryItemRow) -> Result<ReadingHistoryItem, String> {
    let (entry, story_title, story_cover_url, status, last_chapter_title, last_chapter_order) = row;
    Ok(ReadingHistoryItem {
        entry: entry.into_entry()?,
        story_title,
        story_cover_url,
        story_status: story_status(&status)?,
        last_chapter_title,
        last_chapter_order,
    })
}

// ---------------------------------------------------------------------------
// Aggregates (raw SQL)
// ---------------------------------------------------------------------------

/// Story columns shared by aggregate rows.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct StorySummaryRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = SqlUuid)]
    pub author_id: Uuid,
    #[diesel(sql_type = Varchar)]
    pub title: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub cover_url: Option<String>,
    #[diesel(sql_type = Varchar)]
    pub status: String,
}

impl StorySummaryRow {
    fn into_summary(self) -> Result<StorySummary, String> {
        Ok(StorySummary {
            id: story_id(self.id)?,
            author_id: UserId::from_uuid(self.author_id),
            title: self.title,
            cover_url: self.cover_url,
            status: story_status(&self.status)?,
        })
    }
}

/// Ranking row from the top-stories query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct TopStoryRow {
    #[diesel(embed)]
    pub story: StorySummaryRow,
    #[diesel(sql_type = BigInt)]
    pub chapter_count: i64,
    #[diesel(sql_type = BigInt)]
    pub vote_count: i64,
}

impl TopStoryRow {
    pub(crate) fn into_top_story(self) -> Result<TopStory, String> {
        Ok(TopStory {
            story: self.story.into_summary()?,
            chapter_count: count_to_u64(self.chapter_count),
            vote_count: count_to_u64(self.vote_count),
        })
    }
}

/// Engagement row for a single story.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct StoryEngagementRow {
    #[diesel(embed)]
    pub story: StorySummaryRow,
    #[diesel(sql_type = BigInt)]
    pub chapter_count: i64,
    #[diesel(sql_type = BigInt)]
    pub vote_count: i64,
    #[diesel(sql_type = BigInt)]
    pub read_count: i64,
    #[diesel(sql_type = BigInt)]
    pub reader_count: i64,
}

impl StoryEngagementRow {
    pub(crate) fn into_engagement(self) -> Result<StoryEngagement, String> {
        Ok(StoryEngagement {
            story: self.story.into_summary()?,
            chapter_count: count_to_u64(self.chapter_count),
            vote_count: count_to_u64(self.vote_count),
            read_count: count_to_u64(self.read_count),
            reader_count: count_to_u64(self.reader_count),
        })
    }
}

/// Votes for one chapter.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ChapterVotesRow {
    #[diesel(sql_type = BigInt)]
    pub chapter_id: i64,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub chapter_order: i32,
    #[diesel(sql_type = Varchar)]
    pub title: String,
    #[diesel(sql_type = BigInt)]
    pub vote_count: i64,
}

impl ChapterVotesRow {
    pub(crate) fn into_chapter_votes(self) -> Result<ChapterVotes, String> {
        Ok(ChapterVotes {
            chapter_id: chapter_id(self.chapter_id)?,
            chapter_order: self.chapter_order,
            title: self.title,
            vote_count: count_to_u64(self.vote_count),
        })
    }
}
