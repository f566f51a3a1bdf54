use coldstart_types::{CampaignId, Timestamp};
use thiserror::Error;

/// Errors produced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("campaign goal must be positive")]
    InvalidGoal,

    #[error("campaign deadline {deadline} is not after {now}")]
    InvalidDeadline { deadline: Timestamp, now: Timestamp },

    #[error("campaign name must not be empty")]
    InvalidName,

    #[error("campaign not found: {0}")]
    NotFound(CampaignId),

    #[error("raised aggregate overflowed for campaign {0}")]
    RaisedOverflow(CampaignId),

    #[error("raised aggregate would go negative for campaign {0}")]
    RaisedUnderflow(CampaignId),

    #[error("registry lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
