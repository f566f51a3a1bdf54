use coldstart_ledger::LedgerError;
use coldstart_registry::RegistryError;
use coldstart_types::{AccountId, Amount, CampaignId, CampaignStatus, Timestamp};
use thiserror::Error;

/// Errors produced by lifecycle intents.
///
/// Every failure is a local validation result returned synchronously to
/// the caller; the engine never retries internally. Ledger and registry
/// failures (`InvalidAmount`, `InvalidGoal`, `InvalidDeadline`,
/// `NotFound`, `NothingToRefund`, ...) flow through unchanged via the
/// `#[from]` variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("campaign {campaign} is closed to this intent")]
    CampaignClosed { campaign: CampaignId },

    #[error("campaign {campaign} cannot be finalized before its deadline {deadline} (now {now})")]
    TooEarly {
        campaign: CampaignId,
        deadline: Timestamp,
        now: Timestamp,
    },

    #[error("campaign {campaign} is already finalized ({status})")]
    AlreadyFinalized {
        campaign: CampaignId,
        status: CampaignStatus,
    },

    #[error("{caller} is not the creator of campaign {campaign}")]
    NotCreator {
        campaign: CampaignId,
        caller: AccountId,
    },

    #[error("campaign {campaign} is not successful ({status})")]
    NotSuccessful {
        campaign: CampaignId,
        status: CampaignStatus,
    },

    #[error("campaign {campaign} is not failed ({status})")]
    NotFailed {
        campaign: CampaignId,
        status: CampaignStatus,
    },

    #[error(
        "campaign {campaign} aggregate out of balance: cached {cached}, ledger {ledger}"
    )]
    OutOfBalance {
        campaign: CampaignId,
        cached: Amount,
        ledger: Amount,
    },

    #[error("engine lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
