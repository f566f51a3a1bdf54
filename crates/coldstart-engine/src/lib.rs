//! Campaign lifecycle state machine for ColdStart.
//!
//! This crate is the only path to campaign state. Callers submit intents
//! (`create`, `contribute`, `finalize`, `withdraw`, `refund`); the engine
//! consults the injected clock, validates the intent against the current
//! status, applies the transition across registry and ledger, and, for
//! `withdraw` and `refund`, emits a [`SettlementInstruction`] for the
//! settlement authority to execute against external custody.
//!
//! ```text
//! Ongoing ──finalize(now ≥ deadline)──▶ Successful ──withdraw──▶ PaidOut
//!    │
//!    └──────finalize(now ≥ deadline)──▶ Failed ──refund*──▶ (stays Failed)
//! ```
//!
//! Intents on the same campaign are serialized through a per-campaign
//! lock; intents on different campaigns proceed in parallel. Plain reads
//! never take that lock and may observe a slightly stale aggregate.

pub mod engine;
pub mod error;

pub use engine::LifecycleEngine;
pub use error::EngineError;

// Re-export the types callers need to drive the engine.
pub use coldstart_ledger::{Contribution, InMemoryLedger, LedgerReader, LedgerWriter};
pub use coldstart_registry::{Campaign, CampaignMutator, CampaignStore, InMemoryRegistry};
pub use coldstart_types::{
    AccountId, Amount, CampaignId, CampaignStatus, Clock, ManualClock, SettlementInstruction,
    SystemClock, Timestamp, TransferKind,
};
