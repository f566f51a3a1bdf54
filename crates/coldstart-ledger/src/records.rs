use serde::{Deserialize, Serialize};

use coldstart_types::{AccountId, Amount, CampaignId, Timestamp};

/// A single monetary pledge from one account to one campaign.
///
/// Multiple contributions from the same (campaign, contributor) pair are
/// independent records and are summed when queried; there is no upsert.
/// A contribution is immutable except for the `refunded` mark.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub campaign: CampaignId,
    pub contributor: AccountId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    /// Set once by a refund; refunded records are excluded from all live
    /// sums but stay in the ledger for audit.
    pub refunded: bool,
}

impl Contribution {
    pub fn new(
        campaign: CampaignId,
        contributor: AccountId,
        amount: Amount,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            campaign,
            contributor,
            amount,
            timestamp,
            refunded: false,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.refunded
    }
}
