//! In-memory implementation of every ledger repository.
//!
//! Enforces the same rules the PostgreSQL schema does: one vote per
//! [`VoteKey`], one history entry per [`ReadingKey`], last chapters that
//! belong to their story, and last-write-wins by `updated_at`. All state
//! sits behind one mutex, so each operation is atomic.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    EngagementStatsRepository, EngagementStatsRepositoryError, ReadingHistoryRepository,
    ReadingHistoryRepositoryError, VoteRepository, VoteRepositoryError,
};
use crate::domain::{
    ChapterId, ChapterVotes, HistoryCursorKey, ReadPosition, ReadingHistoryEntry,
    ReadingHistoryItem, ReadingKey, StoryEngagement, StoryId, StorySummary, TopStoriesQuery,
    TopStory, UserId, Vote, VoteKey, rank_by_votes,
};

#[derive(Debug, Clone)]
struct ChapterRecord {
    story_id: StoryId,
    order: i32,
    title: String,
}

#[derive(Debug, Clone, Copy)]
struct ReadEvent {
    user_id: UserId,
    story_id: StoryId,
}

#[derive(Debug, Default)]
struct StoreState {
    stories: BTreeMap<StoryId, StorySummary>,
    chapters: BTreeMap<ChapterId, ChapterRecord>,
    votes: BTreeMap<VoteKey, Vote>,
    history: BTreeMap<ReadingKey, ReadingHistoryEntry>,
    reads: Vec<ReadEvent>,
    unavailable: bool,
    pending_upsert_conflicts: usize,
}

impl StoreState {
    fn chapters_of(&self, story_id: StoryId) -> impl Iterator<Item = (&ChapterId, &ChapterRecord)> {
        self.chapters
            .iter()
            .filter(move |(_, chapter)| chapter.story_id == story_id)
    }

    fn votes_for_chapter(&self, chapter_id: ChapterId) -> u64 {
        self.votes
            .keys()
            .filter(|key| key.chapter_id == chapter_id)
            .count() as u64
    }

    fn votes_for_story(&self, story_id: StoryId) -> u64 {
        self.votes
            .keys()
            .filter(|key| {
                self.chapters
                    .get(&key.chapter_id)
                    .is_some_and(|chapter| chapter.story_id == story_id)
            })
            .count() as u64
    }

    fn check_position(&self, position: &ReadPosition) -> Result<(), ReadingHistoryRepositoryError> {
        let story_id = position.key.story_id;
        if !self.stories.contains_key(&story_id) {
            return Err(ReadingHistoryRepositoryError::unknown_story(story_id.get()));
        }
        let belongs = self
            .chapters
            .get(&position.chapter_id)
            .is_some_and(|chapter| chapter.story_id == story_id);
        if !belongs {
            return Err(ReadingHistoryRepositoryError::chapter_not_in_story(
                story_id.get(),
                position.chapter_id.get(),
            ));
        }
        Ok(())
    }

    /// Apply `position` to an existing entry unless the entry is newer.
    fn apply(&mut self, position: &ReadPosition) -> Option<ReadingHistoryEntry> {
        let entry = self.history.get_mut(&position.key)?;
        if entry.updated_at <= position.read_at {
            *entry = position.to_entry();
        }
        Some(*entry)
    }

    fn record_event(&mut self, position: &ReadPosition) {
        self.reads.push(ReadEvent {
            user_id: position.key.user_id,
            story_id: position.key.story_id,
        });
    }

    fn item(&self, entry: &ReadingHistoryEntry) -> Option<ReadingHistoryItem> {
        let story = self.stories.get(&entry.key.story_id)?;
        let chapter = entry
            .last_chapter_id
            .and_then(|chapter_id| self.chapters.get(&chapter_id));
        Some(ReadingHistoryItem {
            entry: *entry,
            story_title: story.title.clone(),
            story_cover_url: story.cover_url.clone(),
            story_status: story.status,
            last_chapter_title: chapter.map(|chapter| chapter.title.clone()),
            last_chapter_order: chapter.map(|chapter| chapter.order),
        })
    }
}

/// Thread-safe in-memory ledger.
///
/// # Examples
/// ```
/// use engagement_ledger::domain::{StoryId, StoryStatus, StorySummary, UserId};
/// use engagement_ledger::test_support::InMemoryEngagementStore;
///
/// let store = InMemoryEngagementStore::default();
/// let story = StoryId::new(1).expect("story id");
/// store.add_story(StorySummary {
///     id: story,
///     author_id: UserId::random(),
///     title: "Tide Tables".to_owned(),
///     cover_url: None,
///     status: StoryStatus::Published,
/// });
/// store.add_chapter(story, 10, 1, "Low Water");
/// assert_eq!(store.history_len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngagementStore {
    state: Mutex<StoreState>,
}

impl InMemoryEngagementStore {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a story.
    pub fn add_story(&self, story: StorySummary) {
        self.lock().stories.insert(story.id, story);
    }

    /// Add or replace a chapter of `story_id`.
    ///
    /// # Panics
    ///
    /// Panics if `chapter_id` is not positive.
    pub fn add_chapter(&self, story_id: StoryId, chapter_id: i64, order: i32, title: &str) {
        let Ok(chapter_id) = ChapterId::new(chapter_id) else {
            panic!("chapter id must be positive, got {chapter_id}");
        };
        self.lock().chapters.insert(
            chapter_id,
            ChapterRecord {
                story_id,
                order,
                title: title.to_owned(),
            },
        );
    }

    /// Remove a chapter, clearing it from history entries and dropping its
    /// votes as the schema's cascades do.
    pub fn remove_chapter(&self, chapter_id: ChapterId) {
        let mut state = self.lock();
        state.chapters.remove(&chapter_id);
        state.votes.retain(|key, _| key.chapter_id != chapter_id);
        for entry in state.history.values_mut() {
            if entry.last_chapter_id == Some(chapter_id) {
                entry.last_chapter_id = None;
            }
        }
    }

    /// Make every operation fail with a connection error while `true`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make the next `count` history upserts fail with a constraint
    /// violation, as a lost insert race would.
    pub fn fail_next_upserts(&self, count: usize) {
        self.lock().pending_upsert_conflicts = count;
    }

    /// Number of stored history entries across all users.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Number of stored votes across all users.
    pub fn vote_len(&self) -> usize {
        self.lock().votes.len()
    }
}

#[async_trait]
impl VoteRepository for InMemoryEngagementStore {
    async fn insert_vote(&self, vote: &Vote) -> Result<(), VoteRepositoryError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(VoteRepositoryError::connection("store unavailable"));
        }
        let chapter_id = vote.key.chapter_id;
        if !state.chapters.contains_key(&chapter_id) {
            return Err(VoteRepositoryError::unknown_chapter(chapter_id.get()));
        }
        if state.votes.contains_key(&vote.key) {
            return Err(VoteRepositoryError::already_voted(chapter_id.get()));
        }
        state.votes.insert(vote.key, *vote);
        Ok(())
    }

    async fn delete_vote(&self, key: &VoteKey) -> Result<(), VoteRepositoryError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(VoteRepositoryError::connection("store unavailable"));
        }
        state
            .votes
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| VoteRepositoryError::not_voted(key.chapter_id.get()))
    }

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VoteRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(VoteRepositoryError::connection("store unavailable"));
        }
        Ok(state.votes.get(key).copied())
    }

    async fn count_for_chapter(&self, chapter_id: ChapterId) -> Result<u64, VoteRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(VoteRepositoryError::connection("store unavailable"));
        }
        Ok(state.votes_for_chapter(chapter_id))
    }

    async fn count_for_story(&self, story_id: StoryId) -> Result<u64, VoteRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(VoteRepositoryError::connection("store unavailable"));
        }
        Ok(state.votes_for_story(story_id))
    }
}

#[async_trait]
impl ReadingHistoryRepository for InMemoryEngagementStore {
    async fn upsert_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<ReadingHistoryEntry, ReadingHistoryRepositoryError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(ReadingHistoryRepositoryError::connection("store unavailable"));
        }
        state.check_position(position)?;
        if state.pending_upsert_conflicts > 0 {
            state.pending_upsert_conflicts -= 1;
            state.history.entry(position.key).or_insert(ReadingHistoryEntry {
                key: position.key,
                last_chapter_id: None,
                updated_at: position.read_at,
            });
            return Err(ReadingHistoryRepositoryError::constraint_violation(
                "reading_history_user_story_key",
            ));
        }
        let stored = match state.apply(position) {
            Some(entry) => entry,
            None => {
                let entry = position.to_entry();
                state.history.insert(position.key, entry);
                entry
            }
        };
        state.record_event(position);
        Ok(stored)
    }

    async fn overwrite_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<Option<ReadingHistoryEntry>, ReadingHistoryRepositoryError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(ReadingHistoryRepositoryError::connection("store unavailable"));
        }
        state.check_position(position)?;
        let stored = state.apply(position);
        if stored.is_some() {
            state.record_event(position);
        }
        Ok(stored)
    }

    async fn find_entry(
        &self,
        key: &ReadingKey,
    ) -> Result<Option<ReadingHistoryItem>, ReadingHistoryRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(ReadingHistoryRepositoryError::connection("store unavailable"));
        }
        Ok(state.history.get(key).and_then(|entry| state.item(entry)))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        after: Option<HistoryCursorKey>,
        limit: usize,
    ) -> Result<Vec<ReadingHistoryItem>, ReadingHistoryRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(ReadingHistoryRepositoryError::connection("store unavailable"));
        }
        let mut entries: Vec<&ReadingHistoryEntry> = state
            .history
            .values()
            .filter(|entry| entry.key.user_id == *user_id)
            .filter(|entry| {
                after.is_none_or(|after| after.admits(entry.updated_at, entry.key.story_id))
            })
            .collect();
        entries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.key.story_id.cmp(&a.key.story_id))
        });
        Ok(entries
            .into_iter()
            .filter_map(|entry| state.item(entry))
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl EngagementStatsRepository for InMemoryEngagementStore {
    async fn chapter_count(&self, story_id: StoryId) -> Result<u64, EngagementStatsRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(EngagementStatsRepositoryError::connection("store unavailable"));
        }
        Ok(state.chapters_of(story_id).count() as u64)
    }

    async fn story_engagement(
        &self,
        story_id: StoryId,
    ) -> Result<Option<StoryEngagement>, EngagementStatsRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(EngagementStatsRepositoryError::connection("store unavailable"));
        }
        let Some(story) = state.stories.get(&story_id) else {
            return Ok(None);
        };
        let reads: Vec<&ReadEvent> = state
            .reads
            .iter()
            .filter(|read| read.story_id == story_id)
            .collect();
        let readers: HashSet<UserId> = reads.iter().map(|read| read.user_id).collect();
        Ok(Some(StoryEngagement {
            story: story.clone(),
            chapter_count: state.chapters_of(story_id).count() as u64,
            vote_count: state.votes_for_story(story_id),
            read_count: reads.len() as u64,
            reader_count: readers.len() as u64,
        }))
    }

    async fn top_stories(
        &self,
        query: &TopStoriesQuery,
    ) -> Result<Vec<TopStory>, EngagementStatsRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(EngagementStatsRepositoryError::connection("store unavailable"));
        }
        let mut ranked: Vec<TopStory> = state
            .stories
            .values()
            .filter(|story| story.status == query.status())
            .map(|story| TopStory {
                story: story.clone(),
                chapter_count: state.chapters_of(story.id).count() as u64,
                vote_count: state.votes_for_story(story.id),
            })
            .collect();
        rank_by_votes(&mut ranked);
        ranked.truncate(query.limit());
        Ok(ranked)
    }

    async fn chapter_vote_breakdown(
        &self,
        story_id: StoryId,
    ) -> Result<Vec<ChapterVotes>, EngagementStatsRepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(EngagementStatsRepositoryError::connection("store unavailable"));
        }
        let mut rows: Vec<ChapterVotes> = state
            .chapters_of(story_id)
            .map(|(chapter_id, chapter)| ChapterVotes {
                chapter_id: *chapter_id,
                chapter_order: chapter.order,
                title: chapter.title.clone(),
                vote_count: state.votes_for_chapter(*chapter_id),
            })
            .collect();
        rows.sort_by_key(|row| row.chapter_order);
        Ok(rows)
    }
}
