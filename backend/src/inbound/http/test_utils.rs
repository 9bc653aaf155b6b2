//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{HttpResponse, test, web};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde::Deserialize;

use crate::domain::{
    EngagementStatsService, Error, ReadingHistoryService, SessionClaims, StoryId, StoryStatus,
    StorySummary, UserId, VoteLedgerService,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::test_support::{InMemoryEngagementStore, MutableClock};

/// Path of the test-only login route registered by [`configure_login`].
pub(crate) const LOGIN_PATH: &str = "/test/login";

pub(crate) const READER: &str = "11111111-1111-1111-1111-111111111111";
pub(crate) const OTHER_READER: &str = "22222222-2222-2222-2222-222222222222";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub(crate) fn start_of_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0)
        .single()
        .expect("timestamp")
}

/// In-memory store and clock backing real services.
pub(crate) struct LedgerHarness {
    pub store: Arc<InMemoryEngagementStore>,
    pub clock: Arc<MutableClock>,
}

impl LedgerHarness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryEngagementStore::default()),
            clock: Arc::new(MutableClock::new(start_of_day())),
        }
    }

    pub fn state(&self) -> web::Data<HttpState> {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let votes = Arc::new(VoteLedgerService::new(self.store.clone(), clock.clone()));
        let history = Arc::new(ReadingHistoryService::new(self.store.clone(), clock.clone()));
        web::Data::new(HttpState::new(
            HttpStatePorts {
                votes: votes.clone(),
                votes_query: votes,
                history: history.clone(),
                history_query: history,
                stats: Arc::new(EngagementStatsService::new(self.store.clone())),
            },
            clock,
        ))
    }
}

#[derive(Deserialize)]
struct LoginQuery {
    user: String,
    ttl_secs: Option<i64>,
}

/// Register a route that stores claims for `?user=<uuid>[&ttl_secs=N]`,
/// issued at the state clock's current time.
pub(crate) fn configure_login(cfg: &mut web::ServiceConfig) {
    cfg.route(
        LOGIN_PATH,
        web::post().to(
            |state: web::Data<HttpState>,
             session: SessionContext,
             query: web::Query<LoginQuery>| async move {
                let user = UserId::new(&query.user).expect("test user id");
                let now = state.clock.utc();
                let claims = match query.ttl_secs {
                    Some(secs) => SessionClaims::issued(user, now, TimeDelta::seconds(secs)),
                    None => SessionClaims::without_expiry(user, now),
                };
                session.persist_claims(&claims)?;
                Ok::<_, Error>(HttpResponse::NoContent().finish())
            },
        ),
    );
}

pub(crate) fn login_request(user: &str, ttl_secs: Option<i64>) -> test::TestRequest {
    let uri = match ttl_secs {
        Some(secs) => format!("{LOGIN_PATH}?user={user}&ttl_secs={secs}"),
        None => format!("{LOGIN_PATH}?user={user}"),
    };
    test::TestRequest::post().uri(&uri)
}

pub(crate) fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Seed a story with chapters `first_chapter..first_chapter + chapters`.
pub(crate) fn seed_story(
    store: &InMemoryEngagementStore,
    story_id: i64,
    status: StoryStatus,
    first_chapter: i64,
    chapters: i32,
) -> StoryId {
    let id = StoryId::new(story_id).expect("story id");
    store.add_story(StorySummary {
        id,
        author_id: UserId::new(OTHER_READER).expect("author id"),
        title: format!("Story {story_id}"),
        cover_url: None,
        status,
    });
    for (offset, order) in (1..=chapters).enumerate() {
        let offset = i64::try_from(offset).expect("offset fits");
        store.add_chapter(
            id,
            first_chapter + offset,
            order,
            &format!("Chapter {order}"),
        );
    }
    id
}
