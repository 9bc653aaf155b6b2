//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The login flow stores [`SessionClaims`] in the session cookie; handlers
//! only ask for an authenticated, unexpired user id.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::{Error, SessionClaims, UserId, is_expired};

pub(crate) const CLAIMS_KEY: &str = "claims";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store claims in the session cookie.
    pub fn persist_claims(&self, claims: &SessionClaims) -> Result<(), Error> {
        self.0
            .insert(CLAIMS_KEY, claims)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Claims stored in the session, if any.
    ///
    /// Undecodable claims are treated as absent.
    pub fn claims(&self) -> Option<SessionClaims> {
        self.0
            .get::<SessionClaims>(CLAIMS_KEY)
            .unwrap_or_else(|error| {
                warn!(%error, "unreadable claims in session cookie");
                None
            })
    }

    /// Require an authenticated user whose session has not expired at the
    /// clock's current time, or fail with `401 Unauthorized`.
    ///
    /// Expired claims are purged from the session.
    pub fn require_user_id(&self, clock: &dyn Clock) -> Result<UserId, Error> {
        let claims = self
            .claims()
            .ok_or_else(|| Error::unauthorized("login required"))?;
        if is_expired(&claims, clock.utc()) {
            debug!(user_id = %claims.user_id, "rejecting expired session");
            self.0.purge();
            return Err(Error::unauthorized("session expired"));
        }
        Ok(claims.user_id)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(Self::new) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use chrono::{TimeDelta, TimeZone, Utc};
    use rstest::rstest;

    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::test_session_middleware;
    use crate::test_support::MutableClock;

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn issued_at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("timestamp")
    }

    async fn status_after(advance_secs: i64, ttl: Option<TimeDelta>) -> (StatusCode, Option<Error>) {
        let clock = Arc::new(MutableClock::new(issued_at()));
        let require_clock = clock.clone();
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/login",
                    web::post().to(move |session: SessionContext| async move {
                        let user = UserId::new(USER).expect("fixture id");
                        let claims = match ttl {
                            Some(ttl) => SessionClaims::issued(user, issued_at(), ttl),
                            None => SessionClaims::without_expiry(user, issued_at()),
                        };
                        session.persist_claims(&claims)?;
                        Ok::<_, Error>(HttpResponse::NoContent())
                    }),
                )
                .route(
                    "/me",
                    web::get().to(move |session: SessionContext| {
                        let clock = require_clock.clone();
                        async move {
                            let id = session.require_user_id(clock.as_ref())?;
                            Ok::<_, Error>(HttpResponse::Ok().body(id.to_string()))
                        }
                    }),
                ),
        )
        .await;

        let login =
            test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
        let cookie = login
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        clock.advance_seconds(advance_secs);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;
        let status = res.status();
        if status.is_success() {
            let body = test::read_body(res).await;
            assert_eq!(body, USER);
            (status, None)
        } else {
            (status, Some(test::read_body_json(res).await))
        }
    }

    #[rstest]
    #[case(0, Some(TimeDelta::hours(1)), StatusCode::OK)]
    #[case(3_599, Some(TimeDelta::hours(1)), StatusCode::OK)]
    #[case(3_600, Some(TimeDelta::hours(1)), StatusCode::UNAUTHORIZED)]
    #[case(86_400 * 365, None, StatusCode::OK)]
    #[actix_web::test]
    async fn session_validity_follows_expiry(
        #[case] advance_secs: i64,
        #[case] ttl: Option<TimeDelta>,
        #[case] expected: StatusCode,
    ) {
        let (status, body) = status_after(advance_secs, ttl).await;
        assert_eq!(status, expected);
        if let Some(error) = body {
            assert_eq!(error.code(), ErrorCode::Unauthorized);
            assert_eq!(error.message(), "session expired");
        }
    }

    #[actix_web::test]
    async fn missing_claims_are_unauthorised() {
        let clock = Arc::new(MutableClock::new(issued_at()));
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/me",
            web::get().to(move |session: SessionContext| {
                let clock = clock.clone();
                async move {
                    session.require_user_id(clock.as_ref())?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let error: Error = test::read_body_json(res).await;
        assert_eq!(error.message(), "login required");
    }
}
