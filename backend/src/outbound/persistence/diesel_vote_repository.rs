//! PostgreSQL-backed `VoteRepository` implementation using Diesel ORM.
//!
//! Uniqueness of a vote rests on the `votes_pkey` primary key. Casting is a
//! single `INSERT ... ON CONFLICT DO NOTHING`: zero inserted rows means the
//! key was already taken, so two concurrent casts yield one stored vote and
//! one `AlreadyVoted`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{VoteRepository, VoteRepositoryError};
use crate::domain::{ChapterId, StoryId, Vote, VoteKey};

use super::diesel_helpers::{
    DieselFailure, VOTES_CHAPTER_FKEY, VOTES_PKEY, VOTES_USER_FKEY, classify_diesel_error,
    count_to_u64,
};
use super::models::VoteRow;
use super::pool::{DbPool, PoolError};
use super::schema::{chapters, votes};

/// Diesel-backed implementation of the [`VoteRepository`] port.
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VoteRepositoryError {
    VoteRepositoryError::connection(error.into_message())
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
    key: &VoteKey,
) -> VoteRepositoryError {
    let failure = classify_diesel_error(error, operation);
    if failure.is_unique_on(VOTES_PKEY) {
        return VoteRepositoryError::already_voted(key.chapter_id.get());
    }
    if failure.is_foreign_key_on(VOTES_CHAPTER_FKEY) {
        return VoteRepositoryError::unknown_chapter(key.chapter_id.get());
    }
    if failure.is_foreign_key_on(VOTES_USER_FKEY) {
        return VoteRepositoryError::unknown_user(key.user_id.to_string());
    }
    match failure {
        DieselFailure::Connection { message } => VoteRepositoryError::connection(message),
        DieselFailure::Query { message } => VoteRepositoryError::query(message),
        DieselFailure::UniqueViolation { constraint }
        | DieselFailure::ForeignKeyViolation { constraint } => VoteRepositoryError::query(
            format!("unexpected constraint violation: {}", constraint.unwrap_or_default()),
        ),
    }
}

fn map_count_error(error: diesel::result::Error, operation: &'static str) -> VoteRepositoryError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection { message } => VoteRepositoryError::connection(message),
        DieselFailure::Query { message } => VoteRepositoryError::query(message),
        other => VoteRepositoryError::query(format!("{other:?}")),
    }
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn insert_vote(&self, vote: &Vote) -> Result<(), VoteRepositoryError> {
        let key = vote.key;
        let row = VoteRow::from_vote(vote);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = diesel::insert_into(votes::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert vote", &key))?;

        if inserted == 0 {
            return Err(VoteRepositoryError::already_voted(key.chapter_id.get()));
        }
        Ok(())
    }

    async fn delete_vote(&self, key: &VoteKey) -> Result<(), VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            votes::table
                .filter(votes::user_id.eq(key.user_id.as_uuid()))
                .filter(votes::chapter_id.eq(key.chapter_id.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, "delete vote", key))?;

        if deleted == 0 {
            return Err(VoteRepositoryError::not_voted(key.chapter_id.get()));
        }
        Ok(())
    }

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<VoteRow> = votes::table
            .filter(votes::user_id.eq(key.user_id.as_uuid()))
            .filter(votes::chapter_id.eq(key.chapter_id.get()))
            .select(VoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "find vote", key))?;

        row.map(VoteRow::into_vote)
            .transpose()
            .map_err(VoteRepositoryError::query)
    }

    async fn count_for_chapter(&self, chapter_id: ChapterId) -> Result<u64, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = votes::table
            .filter(votes::chapter_id.eq(chapter_id.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_count_error(err, "count chapter votes"))?;

        Ok(count_to_u64(count))
    }

    async fn count_for_story(&self, story_id: StoryId) -> Result<u64, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = votes::table
            .inner_join(chapters::table)
            .filter(chapters::story_id.eq(story_id.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_count_error(err, "count story votes"))?;

        Ok(count_to_u64(count))
    }
}

#[cfg(test)]
mod tests {
    //! Constraint mapping for vote writes.

    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};
    use rstest::rstest;

    use super::*;
    use crate::domain::UserId;

    struct ViolatedConstraint(&'static str);

    impl DatabaseErrorInformation for ViolatedConstraint {
        fn message(&self) -> &str {
            "insert or update violates foreign key constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("votes")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn vote_key() -> VoteKey {
        VoteKey::new(
            UserId::new("44444444-4444-4444-4444-444444444444").expect("user id"),
            ChapterId::new(12).expect("chapter id"),
        )
    }

    fn violation(kind: DatabaseErrorKind, constraint: &'static str) -> diesel::result::Error {
        diesel::result::Error::DatabaseError(kind, Box::new(ViolatedConstraint(constraint)))
    }

    #[rstest]
    #[case(
        violation(DatabaseErrorKind::UniqueViolation, VOTES_PKEY),
        VoteRepositoryError::already_voted(12_i64)
    )]
    #[case(
        violation(DatabaseErrorKind::ForeignKeyViolation, VOTES_CHAPTER_FKEY),
        VoteRepositoryError::unknown_chapter(12_i64)
    )]
    #[case(
        violation(DatabaseErrorKind::ForeignKeyViolation, VOTES_USER_FKEY),
        VoteRepositoryError::unknown_user("44444444-4444-4444-4444-444444444444")
    )]
    fn constraint_violations_map_to_port_errors(
        #[case] error: diesel::result::Error,
        #[case] expected: VoteRepositoryError,
    ) {
        assert_eq!(map_diesel_error(error, "insert vote", &vote_key()), expected);
    }

    #[rstest]
    fn unrelated_foreign_keys_stay_query_errors() {
        let error = violation(DatabaseErrorKind::ForeignKeyViolation, "votes_other_fkey");
        assert!(matches!(
            map_diesel_error(error, "insert vote", &vote_key()),
            VoteRepositoryError::Query { .. }
        ));
    }
}
