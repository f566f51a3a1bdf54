use async_trait::async_trait;
use thiserror::Error;

use coldstart_types::SettlementInstruction;

/// A single custody transfer failure.
///
/// `Unavailable` is transient and retried under the authority's policy;
/// `Rejected` is permanent and fails the instruction immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("custody unavailable: {0}")]
    Unavailable(String),

    #[error("custody rejected transfer: {0}")]
    Rejected(String),
}

/// External funds-custody collaborator.
///
/// Implementations move real money (or test doubles pretend to). The
/// authority only relies on the acknowledgement, never on the custody
/// side's internal accounting.
#[async_trait]
pub trait FundsCustody: Send + Sync {
    async fn transfer(&self, instruction: &SettlementInstruction) -> Result<(), CustodyError>;
}
