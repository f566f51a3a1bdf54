use coldstart_types::{AccountId, Amount, CampaignId};

use crate::error::LedgerError;
use crate::records::Contribution;

/// Write boundary for ledger append and refund-mark operations.
pub trait LedgerWriter: Send + Sync {
    /// Append a new contribution. Fails with [`LedgerError::InvalidAmount`]
    /// if the amount is not positive.
    fn record(&self, contribution: Contribution) -> Result<(), LedgerError>;

    /// Mark every live contribution from `contributor` on `campaign` as
    /// refunded and return the summed refunded amount. Fails with
    /// [`LedgerError::NothingToRefund`] if the pair has no live records.
    fn mark_refunded(
        &self,
        campaign: CampaignId,
        contributor: AccountId,
    ) -> Result<Amount, LedgerError>;
}

/// Read boundary for ledger aggregate and history queries.
pub trait LedgerReader: Send + Sync {
    /// Sum of live contributions for a campaign. This is the source of
    /// truth the registry's cached aggregate must always agree with.
    fn total_raised(&self, campaign: CampaignId) -> Result<Amount, LedgerError>;

    /// Sum of live contributions from one contributor on one campaign.
    fn live_total(
        &self,
        campaign: CampaignId,
        contributor: AccountId,
    ) -> Result<Amount, LedgerError>;

    /// All contributions for a campaign in record order, refunded included.
    fn contributions(&self, campaign: CampaignId) -> Result<Vec<Contribution>, LedgerError>;

    /// Number of contribution records for a campaign, refunded included.
    fn contribution_count(&self, campaign: CampaignId) -> Result<u64, LedgerError>;
}
