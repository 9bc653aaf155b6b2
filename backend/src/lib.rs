//! Engagement ledger: per-user story votes, reading history and the
//! aggregate counts derived from them.
//!
//! The crate is laid out hexagonally. [`domain`] holds the ledger rules and
//! ports, [`outbound`] the PostgreSQL adapters, and [`inbound`] the Actix
//! Web surface.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
