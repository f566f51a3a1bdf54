//! Foundation types for the ColdStart campaign engine.
//!
//! This crate provides the identity, monetary, temporal, and instruction
//! types used throughout the ColdStart workspace. Every other crate
//! depends on `coldstart-types`.
//!
//! # Key Types
//!
//! - [`AccountId`] — 20-byte account identity with hex round-trip
//! - [`CampaignId`] — Monotonically assigned campaign identifier
//! - [`Amount`] — Non-negative monetary value in the smallest unit
//! - [`Timestamp`] / [`Clock`] — Unix-second time, injected for testability
//! - [`CampaignStatus`] — First-class lifecycle status variants
//! - [`SettlementInstruction`] — Engine-approved transfer to external custody

pub mod account;
pub mod error;
pub mod money;
pub mod settlement;
pub mod status;
pub mod temporal;

pub use account::AccountId;
pub use error::TypeError;
pub use money::Amount;
pub use settlement::{InstructionId, SettlementInstruction, TransferKind};
pub use status::CampaignStatus;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};

/// Identifier for a campaign, assigned monotonically from zero by the
/// registry. Never reused.
pub type CampaignId = u64;
