use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle status of a campaign.
///
/// Status is a first-class tagged variant, never a bare number that
/// callers can write directly. Transitions happen only through the
/// lifecycle engine's named intents:
///
/// ```text
/// Ongoing ──finalize──▶ Successful ──withdraw──▶ PaidOut
///    │
///    └─────finalize──▶ Failed  (refunds decrement the aggregate but
///                               never leave Failed)
/// ```
///
/// The numeric discriminants match the upstream contract enum
/// (Ongoing = 0 .. PaidOut = 3) so external consumers that still speak
/// numbers can interoperate via [`CampaignStatus::as_u8`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    Ongoing = 0,
    Successful = 1,
    Failed = 2,
    PaidOut = 3,
}

impl CampaignStatus {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, CampaignStatus::Ongoing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::PaidOut)
    }

    /// The upstream numeric discriminant.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Parse the upstream numeric discriminant.
    pub fn from_u8(value: u8) -> Result<Self, TypeError> {
        match value {
            0 => Ok(CampaignStatus::Ongoing),
            1 => Ok(CampaignStatus::Successful),
            2 => Ok(CampaignStatus::Failed),
            3 => Ok(CampaignStatus::PaidOut),
            other => Err(TypeError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CampaignStatus::Ongoing => "ongoing",
            CampaignStatus::Successful => "successful",
            CampaignStatus::Failed => "failed",
            CampaignStatus::PaidOut => "paid-out",
        };
        write!(f, "{text}")
    }
}
