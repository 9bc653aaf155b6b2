//! Outbound adapters implementing the ledger's driven ports.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM.
//!
//! Adapters convert between domain types and storage representations. They
//! hold no business logic.

pub mod persistence;
