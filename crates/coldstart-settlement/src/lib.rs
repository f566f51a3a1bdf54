//! Settlement authority for the ColdStart engine.
//!
//! The authority is the sole component allowed to request an external
//! funds-custody transfer. It never decides amounts or eligibility (the
//! lifecycle engine already validated the instruction); it only executes,
//! exactly once per instruction id, with its own retry policy. A transfer
//! that ultimately fails is recorded and surfaced for operator
//! intervention; it is never fed back into the engine's state machine.

pub mod authority;
pub mod custody;
pub mod error;

pub use authority::{RetryPolicy, SettlementAuthority, SettlementStatus};
pub use custody::{CustodyError, FundsCustody};
pub use error::SettlementError;

pub use coldstart_types::{InstructionId, SettlementInstruction, TransferKind};
