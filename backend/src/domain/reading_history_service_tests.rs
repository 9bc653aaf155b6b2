//! Tests for the reading history service.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockall::Sequence;
use rstest::rstest;

use super::*;
use crate::domain::ports::MockReadingHistoryRepository;
use crate::domain::{ChapterId, ErrorCode, HistoryCursorKey, StoryId, StoryStatus, UserId};
use crate::test_support::MutableClock;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 21, 0, 0)
        .single()
        .expect("timestamp")
}

fn user() -> UserId {
    UserId::new("33333333-3333-3333-3333-333333333333").expect("user id")
}

fn key(story: i64) -> ReadingKey {
    ReadingKey::new(user(), StoryId::new(story).expect("story id"))
}

fn request(story: i64, chapter: i64) -> RecordReadRequest {
    RecordReadRequest {
        key: key(story),
        chapter_id: ChapterId::new(chapter).expect("chapter id"),
    }
}

fn item(story: i64, minutes_ago: i64) -> ReadingHistoryItem {
    ReadingHistoryItem {
        entry: ReadingHistoryEntry {
            key: key(story),
            last_chapter_id: None,
            updated_at: now() - TimeDelta::minutes(minutes_ago),
        },
        story_title: format!("Story {story}"),
        story_cover_url: None,
        story_status: StoryStatus::Published,
        last_chapter_title: None,
        last_chapter_order: None,
    }
}

fn make_service(
    repo: MockReadingHistoryRepository,
) -> ReadingHistoryService<MockReadingHistoryRepository> {
    ReadingHistoryService::new(Arc::new(repo), Arc::new(MutableClock::new(now())))
}

fn details_code(err: &Error) -> Option<&str> {
    err.details()
        .and_then(|details| details.get("code"))
        .and_then(|code| code.as_str())
}

#[tokio::test]
async fn record_read_upserts_with_clock_time() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .withf(|position| position.read_at == now() && position.key == key(7))
        .times(1)
        .return_once(|position| Ok(position.to_entry()));
    repo.expect_overwrite_entry().never();

    let entry = make_service(repo)
        .record_read(request(7, 70))
        .await
        .expect("read recorded");

    assert_eq!(entry.last_chapter_id, ChapterId::new(70).ok());
    assert_eq!(entry.updated_at, now());
}

#[tokio::test]
async fn record_read_stamps_at_microsecond_precision() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .withf(|position| position.read_at == now() + TimeDelta::microseconds(250_001))
        .times(1)
        .return_once(|position| Ok(position.to_entry()));
    let clock = MutableClock::new(now() + TimeDelta::nanoseconds(250_001_999));
    let service = ReadingHistoryService::new(Arc::new(repo), Arc::new(clock));

    let entry = service
        .record_read(request(7, 70))
        .await
        .expect("read recorded");

    assert_eq!(entry.updated_at.timestamp_subsec_nanos(), 250_001_000);
}

#[tokio::test]
async fn constraint_violation_is_retried_once_as_update() {
    let mut seq = Sequence::new();
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(ReadingHistoryRepositoryError::constraint_violation("race")));
    repo.expect_overwrite_entry()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|position| Ok(Some(position.to_entry())));

    let entry = make_service(repo)
        .record_read(request(7, 71))
        .await
        .expect("retry succeeds");

    assert_eq!(entry.key, key(7));
    assert_eq!(entry.last_chapter_id, ChapterId::new(71).ok());
}

#[tokio::test]
async fn failed_retry_surfaces_conflict() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .times(1)
        .return_once(|_| Err(ReadingHistoryRepositoryError::constraint_violation("race")));
    repo.expect_overwrite_entry()
        .times(1)
        .return_once(|_| Ok(None));

    let err = make_service(repo)
        .record_read(request(7, 71))
        .await
        .expect_err("retry gives up");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(details_code(&err), Some("constraint_violation"));
}

#[tokio::test]
async fn retry_is_not_repeated_on_second_violation() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .times(1)
        .return_once(|_| Err(ReadingHistoryRepositoryError::constraint_violation("race")));
    repo.expect_overwrite_entry()
        .times(1)
        .return_once(|_| Err(ReadingHistoryRepositoryError::constraint_violation("again")));

    let err = make_service(repo)
        .record_read(request(7, 71))
        .await
        .expect_err("second violation propagates");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(
    ReadingHistoryRepositoryError::chapter_not_in_story(7_i64, 99_i64),
    ErrorCode::InvalidRequest,
    "chapter_not_in_story"
)]
#[case(
    ReadingHistoryRepositoryError::unknown_story(7_i64),
    ErrorCode::NotFound,
    "story_not_found"
)]
#[case(
    ReadingHistoryRepositoryError::unknown_user(user().to_string()),
    ErrorCode::NotFound,
    "user_not_found"
)]
#[tokio::test]
async fn record_read_maps_catalogue_failures(
    #[case] failure: ReadingHistoryRepositoryError,
    #[case] expected: ErrorCode,
    #[case] code: &str,
) {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .times(1)
        .return_once(move |_| Err(failure));

    let err = make_service(repo)
        .record_read(request(7, 99))
        .await
        .expect_err("failure propagates");

    assert_eq!(err.code(), expected);
    assert_eq!(details_code(&err), Some(code));
}

#[tokio::test]
async fn connection_failure_is_service_unavailable() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_upsert_entry()
        .times(1)
        .return_once(|_| Err(ReadingHistoryRepositoryError::connection("pool timed out")));

    let err = make_service(repo)
        .record_read(request(7, 70))
        .await
        .expect_err("store down");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn history_page_probes_one_extra_item() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_list_for_user()
        .withf(|_, after, limit| after.is_none() && *limit == 3)
        .times(1)
        .return_once(|_, _, _| Ok(vec![item(1, 0), item(2, 1), item(3, 2)]));

    let page = make_service(repo)
        .history_page(&HistoryPageRequest {
            user_id: user(),
            after: None,
            limit: 2,
        })
        .await
        .expect("page");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next, Some(item(2, 1).cursor_key()));
}

#[tokio::test]
async fn last_page_has_no_next_key() {
    let after = HistoryCursorKey {
        updated_at: now(),
        story_id: StoryId::new(9).expect("story id"),
    };
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_list_for_user()
        .withf(move |_, a, _| *a == Some(after))
        .times(1)
        .return_once(|_, _, _| Ok(vec![item(1, 5)]));

    let page = make_service(repo)
        .history_page(&HistoryPageRequest {
            user_id: user(),
            after: Some(after),
            limit: 12,
        })
        .await
        .expect("page");

    assert_eq!(page.items.len(), 1);
    assert!(page.next.is_none());
}

#[rstest]
#[case(0, 2)]
#[case(500, HISTORY_PAGE_MAX_LIMIT + 1)]
#[tokio::test]
async fn history_page_clamps_limit(#[case] requested: usize, #[case] fetched: usize) {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_list_for_user()
        .withf(move |_, _, limit| *limit == fetched)
        .times(1)
        .return_once(|_, _, _| Ok(Vec::new()));

    let page = make_service(repo)
        .history_page(&HistoryPageRequest {
            user_id: user(),
            after: None,
            limit: requested,
        })
        .await
        .expect("page");

    assert!(page.items.is_empty());
}

#[tokio::test]
async fn missing_entry_is_not_found() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_find_entry().times(1).return_once(|_| Ok(None));

    let err = make_service(repo)
        .entry(&key(4))
        .await
        .expect_err("no entry");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(details_code(&err), Some("reading_history_not_found"));
}

#[tokio::test]
async fn entry_returns_joined_item() {
    let mut repo = MockReadingHistoryRepository::new();
    repo.expect_find_entry()
        .times(1)
        .return_once(|_| Ok(Some(item(4, 0))));

    let found = make_service(repo).entry(&key(4)).await.expect("entry");

    assert_eq!(found.story_title, "Story 4");
}
