use std::sync::RwLock;

use tracing::{debug, info};

use coldstart_types::{AccountId, Amount, CampaignId, CampaignStatus, Timestamp};

use crate::error::{RegistryError, Result};
use crate::traits::{CampaignMutator, CampaignStore};
use crate::types::Campaign;

/// In-memory registry for tests, local demos, and embedding.
///
/// Campaigns live in a `Vec` behind a `RwLock`; a campaign's id is its
/// arena position, which gives monotonic allocation from zero for free.
#[derive(Default)]
pub struct InMemoryRegistry {
    inner: RwLock<Vec<Campaign>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_campaign<T>(
        &self,
        id: CampaignId,
        apply: impl FnOnce(&mut Campaign) -> Result<T>,
    ) -> Result<T> {
        let mut campaigns = self.inner.write().map_err(|_| RegistryError::LockPoisoned)?;
        let campaign = campaigns
            .get_mut(id as usize)
            .ok_or(RegistryError::NotFound(id))?;
        apply(campaign)
    }
}

impl CampaignStore for InMemoryRegistry {
    fn create(
        &self,
        creator: AccountId,
        name: &str,
        description: &str,
        goal: Amount,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Campaign> {
        if goal.is_zero() {
            return Err(RegistryError::InvalidGoal);
        }
        if deadline <= now {
            return Err(RegistryError::InvalidDeadline { deadline, now });
        }
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let mut campaigns = self.inner.write().map_err(|_| RegistryError::LockPoisoned)?;
        let campaign = Campaign {
            id: campaigns.len() as CampaignId,
            creator,
            name: name.to_string(),
            description: description.to_string(),
            goal,
            deadline,
            amount_raised: Amount::ZERO,
            status: CampaignStatus::Ongoing,
        };
        campaigns.push(campaign.clone());

        info!(
            campaign = campaign.id,
            creator = %creator.short_id(),
            goal = %goal,
            deadline = %deadline,
            "campaign created"
        );
        Ok(campaign)
    }

    fn get(&self, id: CampaignId) -> Result<Campaign> {
        let campaigns = self.inner.read().map_err(|_| RegistryError::LockPoisoned)?;
        campaigns
            .get(id as usize)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    fn campaign_count(&self) -> Result<u64> {
        let campaigns = self.inner.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(campaigns.len() as u64)
    }
}

impl CampaignMutator for InMemoryRegistry {
    fn set_status(&self, id: CampaignId, status: CampaignStatus) -> Result<()> {
        self.with_campaign(id, |campaign| {
            debug!(campaign = id, from = %campaign.status, to = %status, "status updated");
            campaign.status = status;
            Ok(())
        })
    }

    fn add_raised(&self, id: CampaignId, amount: Amount) -> Result<Amount> {
        self.with_campaign(id, |campaign| {
            campaign.amount_raised = campaign
                .amount_raised
                .checked_add(amount)
                .ok_or(RegistryError::RaisedOverflow(id))?;
            Ok(campaign.amount_raised)
        })
    }

    fn sub_raised(&self, id: CampaignId, amount: Amount) -> Result<Amount> {
        self.with_campaign(id, |campaign| {
            campaign.amount_raised = campaign
                .amount_raised
                .checked_sub(amount)
                .ok_or(RegistryError::RaisedUnderflow(id))?;
            Ok(campaign.amount_raised)
        })
    }
}
