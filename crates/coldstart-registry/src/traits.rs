use coldstart_types::{AccountId, Amount, CampaignId, CampaignStatus, Timestamp};

use crate::error::Result;
use crate::types::Campaign;

/// Read/create boundary for campaign records.
pub trait CampaignStore: Send + Sync {
    /// Validate and store a new campaign.
    ///
    /// Allocates the next id, sets status `Ongoing` and a zero aggregate.
    /// Fails with `InvalidGoal` for a zero goal, `InvalidDeadline` when
    /// the deadline is not strictly after `now`, and `InvalidName` for an
    /// empty name.
    fn create(
        &self,
        creator: AccountId,
        name: &str,
        description: &str,
        goal: Amount,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Campaign>;

    /// Fetch one campaign. Fails with `NotFound` if absent.
    fn get(&self, id: CampaignId) -> Result<Campaign>;

    /// Number of campaigns ever created.
    fn campaign_count(&self) -> Result<u64>;

    /// Lazy sequence of all campaigns in creation order.
    ///
    /// The iterator snapshots the campaign count when constructed, so it
    /// is finite even while new campaigns are being created, and it can be
    /// restarted by calling `list()` again. Each step re-reads the store,
    /// so yielded records reflect the store at iteration time. Fails only
    /// if the store itself cannot be read (e.g. a poisoned lock).
    fn list(&self) -> Result<CampaignIter<'_, Self>>
    where
        Self: Sized,
    {
        CampaignIter::new(self)
    }
}

/// Mutation boundary reserved for the lifecycle engine.
///
/// The registry has no logic of its own deciding success or failure:
/// these operations only apply transitions and deltas the engine has
/// already validated.
pub trait CampaignMutator: Send + Sync {
    /// Overwrite a campaign's status.
    fn set_status(&self, id: CampaignId, status: CampaignStatus) -> Result<()>;

    /// Increase the cached aggregate after a recorded contribution.
    fn add_raised(&self, id: CampaignId, amount: Amount) -> Result<Amount>;

    /// Decrease the cached aggregate after a refund; refuses to go
    /// negative.
    fn sub_raised(&self, id: CampaignId, amount: Amount) -> Result<Amount>;
}

/// Lazy, restartable iterator over campaigns in creation order.
pub struct CampaignIter<'a, S: CampaignStore> {
    store: &'a S,
    next_id: CampaignId,
    end: CampaignId,
}

impl<'a, S: CampaignStore> CampaignIter<'a, S> {
    fn new(store: &'a S) -> Result<Self> {
        let end = store.campaign_count()?;
        Ok(Self {
            store,
            next_id: 0,
            end,
        })
    }
}

impl<S: CampaignStore> core::fmt::Debug for CampaignIter<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CampaignIter")
            .field("next_id", &self.next_id)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

impl<S: CampaignStore> Iterator for CampaignIter<'_, S> {
    type Item = Campaign;

    fn next(&mut self) -> Option<Campaign> {
        while self.next_id < self.end {
            let id = self.next_id;
            self.next_id += 1;
            if let Ok(campaign) = self.store.get(id) {
                return Some(campaign);
            }
        }
        None
    }
}
