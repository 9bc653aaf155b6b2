//! Inbound adapters translating external requests into ledger port calls.
//!
//! The REST surface lives under [`http`].

pub mod http;
