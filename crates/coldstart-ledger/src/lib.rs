//! Append-only contribution ledger for the ColdStart engine.
//!
//! The ledger is the authoritative record of every contribution ever made.
//! Contributions are never deleted: a refund marks the affected records
//! refunded in place, so the full history stays auditable. The sum of live
//! (non-refunded) contributions for a campaign is the source of truth that
//! the registry's cached aggregate is reconciled against.
//!
//! This crate provides:
//! - [`Contribution`] record type
//! - [`LedgerWriter`] / [`LedgerReader`] trait boundaries
//! - [`InMemoryLedger`] arena+index implementation for tests and embedding

pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use records::Contribution;
pub use traits::{LedgerReader, LedgerWriter};
