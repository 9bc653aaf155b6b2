//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`*Repository`) are implemented by storage adapters and expose
//! strongly typed errors, so every adapter maps its failures onto the same
//! small set of variants. Driving ports (`*Command`, `*Query`) are what
//! inbound adapters call; they speak the domain [`Error`](super::Error).

mod macros;

mod engagement_stats_query;
mod engagement_stats_repository;
mod reading_history_command;
mod reading_history_query;
mod reading_history_repository;
mod vote_command;
mod vote_query;
mod vote_repository;

pub(crate) use macros::define_port_error;

#[cfg(test)]
pub use engagement_stats_query::MockEngagementStatsQuery;
pub use engagement_stats_query::EngagementStatsQuery;
#[cfg(test)]
pub use engagement_stats_repository::MockEngagementStatsRepository;
pub use engagement_stats_repository::{EngagementStatsRepository, EngagementStatsRepositoryError};
#[cfg(test)]
pub use reading_history_command::MockReadingHistoryCommand;
pub use reading_history_command::{ReadingHistoryCommand, RecordReadRequest};
#[cfg(test)]
pub use reading_history_query::MockReadingHistoryQuery;
pub use reading_history_query::ReadingHistoryQuery;
#[cfg(test)]
pub use reading_history_repository::MockReadingHistoryRepository;
pub use reading_history_repository::{ReadingHistoryRepository, ReadingHistoryRepositoryError};
#[cfg(test)]
pub use vote_command::MockVoteCommand;
pub use vote_command::VoteCommand;
#[cfg(test)]
pub use vote_query::MockVoteQuery;
pub use vote_query::VoteQuery;
#[cfg(test)]
pub use vote_repository::MockVoteRepository;
pub use vote_repository::{VoteRepository, VoteRepositoryError};
