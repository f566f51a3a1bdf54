use coldstart_types::InstructionId;
use thiserror::Error;

/// Errors produced by the settlement authority itself.
///
/// A custody transfer that fails after retries is not an error here; it
/// is recorded as a `Failed` settlement status. These variants cover the
/// authority's own bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("instruction {0} is already being executed")]
    AlreadyInFlight(InstructionId),

    #[error("settlement status lock poisoned")]
    LockPoisoned,
}
