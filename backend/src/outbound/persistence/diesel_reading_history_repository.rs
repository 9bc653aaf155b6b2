//! PostgreSQL-backed `ReadingHistoryRepository` implementation.
//!
//! Recording a read is one transaction: an `INSERT ... ON CONFLICT DO UPDATE`
//! keyed by `reading_history_user_story_key`, then an append to
//! `story_reads`. The update only applies when the incoming read is not older
//! than the stored one, so a delayed write cannot move the position back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Timestamptz, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ReadingHistoryRepository, ReadingHistoryRepositoryError};
use crate::domain::{
    HistoryCursorKey, ReadPosition, ReadingHistoryEntry, ReadingHistoryItem, ReadingKey, UserId,
};

use super::diesel_helpers::{
    DieselFailure, READING_HISTORY_CHAPTER_STORY_FKEY, READING_HISTORY_STORY_FKEY,
    READING_HISTORY_USER_FKEY, READING_HISTORY_USER_STORY_KEY, STORY_READS_USER_FKEY,
    classify_diesel_error,
};
use super::models::{NewStoryReadRow, ReadingHistoryItemRow, ReadingHistoryRow, item_from_row};
use super::pool::{DbPool, PoolError};
use super::schema::{chapters, reading_history, stories, story_reads};

const UPSERT_ENTRY_SQL: &str = "\
INSERT INTO reading_history (user_id, story_id, last_chapter_id, updated_at) \
VALUES ($1, $2, $3, $4) \
ON CONFLICT ON CONSTRAINT reading_history_user_story_key DO UPDATE \
SET last_chapter_id = EXCLUDED.last_chapter_id, updated_at = EXCLUDED.updated_at \
WHERE reading_history.updated_at <= EXCLUDED.updated_at \
RETURNING user_id, story_id, last_chapter_id, updated_at";

/// Diesel-backed implementation of the [`ReadingHistoryRepository`] port.
#[derive(Clone)]
pub struct DieselReadingHistoryRepository {
    pool: DbPool,
}

impl DieselReadingHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReadingHistoryRepositoryError {
    ReadingHistoryRepositoryError::connection(error.into_message())
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
    position: Option<&ReadPosition>,
) -> ReadingHistoryRepositoryError {
    let failure = classify_diesel_error(error, operation);
    if let Some(position) = position {
        let story_id = position.key.story_id.get();
        if failure.is_foreign_key_on(READING_HISTORY_CHAPTER_STORY_FKEY)
            || failure.is_foreign_key_on("story_reads_chapter_id_fkey")
        {
            return ReadingHistoryRepositoryError::chapter_not_in_story(
                story_id,
                position.chapter_id.get(),
            );
        }
        if failure.is_foreign_key_on(READING_HISTORY_STORY_FKEY)
            || failure.is_foreign_key_on("story_reads_story_id_fkey")
        {
            return ReadingHistoryRepositoryError::unknown_story(story_id);
        }
        if failure.is_foreign_key_on(READING_HISTORY_USER_FKEY)
            || failure.is_foreign_key_on(STORY_READS_USER_FKEY)
        {
            return ReadingHistoryRepositoryError::unknown_user(position.key.user_id.to_string());
        }
    }
    if failure.is_unique_on(READING_HISTORY_USER_STORY_KEY) {
        return ReadingHistoryRepositoryError::constraint_violation(READING_HISTORY_USER_STORY_KEY);
    }
    match failure {
        DieselFailure::Connection { message } => ReadingHistoryRepositoryError::connection(message),
        DieselFailure::Query { message } => ReadingHistoryRepositoryError::query(message),
        DieselFailure::UniqueViolation { constraint }
        | DieselFailure::ForeignKeyViolation { constraint } => ReadingHistoryRepositoryError::query(
            format!("unexpected constraint violation: {}", constraint.unwrap_or_default()),
        ),
    }
}

fn read_event(position: &ReadPosition) -> NewStoryReadRow {
    NewStoryReadRow {
        user_id: *position.key.user_id.as_uuid(),
        story_id: position.key.story_id.get(),
        chapter_id: Some(position.chapter_id.get()),
        created_at: position.read_at,
    }
}

fn to_query_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

async fn load_entry(
    conn: &mut AsyncPgConnection,
    key: &ReadingKey,
) -> Result<Option<ReadingHistoryRow>, diesel::result::Error> {
    reading_history::table
        .filter(reading_history::user_id.eq(key.user_id.as_uuid()))
        .filter(reading_history::story_id.eq(key.story_id.get()))
        .select(ReadingHistoryRow::as_select())
        .first(conn)
        .await
        .optional()
}

async fn append_read_event(
    conn: &mut AsyncPgConnection,
    position: &ReadPosition,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(story_reads::table)
        .values(&read_event(position))
        .execute(conn)
        .await
        .map(|_| ())
}

fn entry_from_row(row: ReadingHistoryRow) -> Result<ReadingHistoryEntry, ReadingHistoryRepositoryError> {
    row.into_entry().map_err(ReadingHistoryRepositoryError::query)
}

#[async_trait]
impl ReadingHistoryRepository for DieselReadingHistoryRepository {
    async fn upsert_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<ReadingHistoryEntry, ReadingHistoryRepositoryError> {
        let position = *position;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction(|conn| {
                async move {
                    let applied: Option<ReadingHistoryRow> = sql_query(UPSERT_ENTRY_SQL)
                        .bind::<SqlUuid, _>(*position.key.user_id.as_uuid())
                        .bind::<BigInt, _>(position.key.story_id.get())
                        .bind::<BigInt, _>(position.chapter_id.get())
                        .bind::<Timestamptz, _>(position.read_at)
                        .get_result(conn)
                        .await
                        .optional()?;
                    let stored = match applied {
                        Some(row) => row,
                        // A newer read already won; report what is stored.
                        None => load_entry(conn, &position.key)
                            .await?
                            .ok_or(diesel::result::Error::NotFound)?,
                    };
                    append_read_event(conn, &position).await?;
                    Ok::<_, diesel::result::Error>(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(err, "upsert reading history", Some(&position)))?;

        entry_from_row(row)
    }

    async fn overwrite_entry(
        &self,
        position: &ReadPosition,
    ) -> Result<Option<ReadingHistoryEntry>, ReadingHistoryRepositoryError> {
        let position = *position;
        let read_at: DateTime<Utc> = position.read_at;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction(|conn| {
                async move {
                    let target = reading_history::table
                        .filter(reading_history::user_id.eq(position.key.user_id.as_uuid()))
                        .filter(reading_history::story_id.eq(position.key.story_id.get()))
                        .filter(reading_history::updated_at.le(read_at));
                    let updated: Option<ReadingHistoryRow> = diesel::update(target)
                        .set((
                            reading_history::last_chapter_id.eq(Some(position.chapter_id.get())),
                            reading_history::updated_at.eq(read_at),
                        ))
                        .returning(ReadingHistoryRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    let stored = match updated {
                        Some(row) => Some(row),
                        None => load_entry(conn, &position.key).await?,
                    };
                    if stored.is_some() {
                        append_read_event(conn, &position).await?;
                    }
                    Ok::<_, diesel::result::Error>(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(err, "overwrite reading history", Some(&position)))?;

        row.map(entry_from_row).transpose()
    }

    async fn find_entry(
        &self,
        key: &ReadingKey,
    ) -> Result<Option<ReadingHistoryItem>, ReadingHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ReadingHistoryItemRow> = reading_history::table
            .inner_join(stories::table)
            .left_join(
                chapters::table.on(chapters::id.nullable().eq(reading_history::last_chapter_id)),
            )
            .filter(reading_history::user_id.eq(key.user_id.as_uuid()))
            .filter(reading_history::story_id.eq(key.story_id.get()))
            .select((
                ReadingHistoryRow::as_select(),
                stories::title,
                stories::cover_url,
                stories::status,
                chapters::title.nullable(),
                chapters::chapter_order.nullable(),
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find reading history", None))?;

        row.map(item_from_row)
            .transpose()
            .map_err(ReadingHistoryRepositoryError::query)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        after: Option<HistoryCursorKey>,
        limit: usize,
    ) -> Result<Vec<ReadingHistoryItem>, ReadingHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = reading_history::table
            .inner_join(stories::table)
            .left_join(
                chapters::table.on(chapters::id.nullable().eq(reading_history::last_chapter_id)),
            )
            .filter(reading_history::user_id.eq(*user_id.as_uuid()))
            .select((
                ReadingHistoryRow::as_select(),
                stories::title,
                stories::cover_url,
                stories::status,
                chapters::title.nullable(),
                chapters::chapter_order.nullable(),
            ))
            .into_boxed();

        if let Some(after) = after {
            let story_id = after.story_id.get();
            query = query.filter(
                reading_history::updated_at.lt(after.updated_at).or(reading_history::updated_at
                    .eq(after.updated_at)
                    .and(reading_history::story_id.lt(story_id))),
            );
        }

        let rows: Vec<ReadingHistoryItemRow> = query
            .order((
                reading_history::updated_at.desc(),
                reading_history::story_id.desc(),
            ))
            .limit(to_query_limit(limit))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "list reading history", None))?;

        rows.into_iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ReadingHistoryRepositoryError::query)
    }
}
