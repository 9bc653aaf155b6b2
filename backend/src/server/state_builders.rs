//! Wire Diesel repositories into ledger services and handler state.

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use mockable::{Clock, DefaultClock};

use engagement_ledger::domain::{EngagementStatsService, ReadingHistoryService, VoteLedgerService};
use engagement_ledger::inbound::http::health::ReadinessProbe;
use engagement_ledger::inbound::http::state::{HttpState, HttpStatePorts};
use engagement_ledger::outbound::persistence::{
    DbPool, DieselEngagementStatsRepository, DieselReadingHistoryRepository, DieselVoteRepository,
};

/// Build handler state backed by PostgreSQL repositories.
pub(crate) fn build_http_state(pool: &DbPool) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let votes = Arc::new(VoteLedgerService::new(
        Arc::new(DieselVoteRepository::new(pool.clone())),
        clock.clone(),
    ));
    let history = Arc::new(ReadingHistoryService::new(
        Arc::new(DieselReadingHistoryRepository::new(pool.clone())),
        clock.clone(),
    ));
    let stats = Arc::new(EngagementStatsService::new(Arc::new(
        DieselEngagementStatsRepository::new(pool.clone()),
    )));

    web::Data::new(HttpState::new(
        HttpStatePorts {
            votes: votes.clone(),
            votes_query: votes,
            history: history.clone(),
            history_query: history,
            stats,
        },
        clock,
    ))
}

/// Readiness check that round-trips a trivial query through the pool.
pub(crate) struct PoolProbe {
    pool: DbPool,
}

impl PoolProbe {
    pub(crate) const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for PoolProbe {
    async fn check(&self) -> Result<(), String> {
        let mut conn = self.pool.get().await.map_err(|err| err.to_string())?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}
