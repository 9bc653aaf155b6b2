//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the ledger's driven ports backed by
//! PostgreSQL via `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Ledger rules that need atomicity (one vote per key, one
//!   history entry per key) are enforced by constraints in `migrations/`.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Diesel failures are classified once in
//!   `diesel_helpers` and mapped onto each port's error enum.
//!
//! # Example
//!
//! ```no_run
//! use engagement_ledger::outbound::persistence::{DbPool, DieselVoteRepository, PoolConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ledger")).await?;
//! let _votes = DieselVoteRepository::new(pool);
//! # Ok(())
//! # }
//! ```

pub(crate) mod diesel_helpers;
mod diesel_engagement_stats_repository;
mod diesel_reading_history_repository;
mod diesel_vote_repository;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_engagement_stats_repository::DieselEngagementStatsRepository;
pub use diesel_reading_history_repository::DieselReadingHistoryRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use migrations::{MIGRATIONS, MigrationError, apply_pending_migrations, run_migrations};
pub use pool::{DbConnection, DbPool, PoolConfig, PoolError};
