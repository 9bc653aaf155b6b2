//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only see driving
//! ports, so they can be exercised with mocks or the in-memory store.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    EngagementStatsQuery, ReadingHistoryCommand, ReadingHistoryQuery, VoteCommand, VoteQuery,
};

/// Parameter object bundling the port implementations for [`HttpState`].
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Cast and retract votes.
    pub votes: Arc<dyn VoteCommand>,
    /// Vote lookups and counts.
    pub votes_query: Arc<dyn VoteQuery>,
    /// Record reads.
    pub history: Arc<dyn ReadingHistoryCommand>,
    /// Reading history lookups.
    pub history_query: Arc<dyn ReadingHistoryQuery>,
    /// Derived counts and rankings.
    pub stats: Arc<dyn EngagementStatsQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub votes: Arc<dyn VoteCommand>,
    pub votes_query: Arc<dyn VoteQuery>,
    pub history: Arc<dyn ReadingHistoryCommand>,
    pub history_query: Arc<dyn ReadingHistoryQuery>,
    pub stats: Arc<dyn EngagementStatsQuery>,
    /// Time source for session expiry checks.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Assemble state from ports and a clock.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use engagement_ledger::domain::{
    ///     EngagementStatsService, ReadingHistoryService, VoteLedgerService,
    /// };
    /// use engagement_ledger::inbound::http::state::{HttpState, HttpStatePorts};
    /// use engagement_ledger::test_support::InMemoryEngagementStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryEngagementStore::default());
    /// let clock: Arc<dyn mockable::Clock> = Arc::new(DefaultClock);
    /// let votes = Arc::new(VoteLedgerService::new(store.clone(), clock.clone()));
    /// let history = Arc::new(ReadingHistoryService::new(store.clone(), clock.clone()));
    /// let _state = HttpState::new(
    ///     HttpStatePorts {
    ///         votes: votes.clone(),
    ///         votes_query: votes,
    ///         history: history.clone(),
    ///         history_query: history,
    ///         stats: Arc::new(EngagementStatsService::new(store)),
    ///     },
    ///     clock,
    /// );
    /// ```
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>) -> Self {
        let HttpStatePorts {
            votes,
            votes_query,
            history,
            history_query,
            stats,
        } = ports;
        Self {
            votes,
            votes_query,
            history,
            history_query,
            stats,
            clock,
        }
    }
}
