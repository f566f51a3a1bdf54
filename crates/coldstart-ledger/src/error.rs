use coldstart_types::{AccountId, CampaignId};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("contribution amount must be positive")]
    InvalidAmount,

    #[error("no live contributions to refund for {contributor} on campaign {campaign}")]
    NothingToRefund {
        campaign: CampaignId,
        contributor: AccountId,
    },

    #[error("contribution total overflowed")]
    AmountOverflow,

    #[error("ledger lock poisoned")]
    LockPoisoned,
}
