use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use coldstart_types::{AccountId, Amount, CampaignId};

use crate::error::LedgerError;
use crate::records::Contribution;
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ledger for tests, local demos, and embedding.
///
/// Contributions live in a single append-only arena; a per-campaign index
/// maps campaign ids to arena positions so aggregate queries never scan
/// unrelated campaigns.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<Contribution>,
    by_campaign: HashMap<CampaignId, Vec<usize>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerWriter for InMemoryLedger {
    fn record(&self, contribution: Contribution) -> Result<(), LedgerError> {
        if contribution.amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;

        let index = state.entries.len();
        state
            .by_campaign
            .entry(contribution.campaign)
            .or_default()
            .push(index);
        debug!(
            campaign = contribution.campaign,
            contributor = %contribution.contributor.short_id(),
            amount = %contribution.amount,
            "contribution recorded"
        );
        state.entries.push(contribution);
        Ok(())
    }

    fn mark_refunded(
        &self,
        campaign: CampaignId,
        contributor: AccountId,
    ) -> Result<Amount, LedgerError> {
        let mut state = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;

        let indices = state
            .by_campaign
            .get(&campaign)
            .cloned()
            .unwrap_or_default();

        let mut refunded_total = Amount::ZERO;
        for index in indices {
            let entry = &mut state.entries[index];
            if entry.contributor != contributor || !entry.is_live() {
                continue;
            }
            refunded_total = refunded_total
                .checked_add(entry.amount)
                .ok_or(LedgerError::AmountOverflow)?;
            entry.refunded = true;
        }

        if refunded_total.is_zero() {
            return Err(LedgerError::NothingToRefund {
                campaign,
                contributor,
            });
        }

        debug!(
            campaign,
            contributor = %contributor.short_id(),
            refunded = %refunded_total,
            "contributions marked refunded"
        );
        Ok(refunded_total)
    }
}

impl LedgerReader for InMemoryLedger {
    fn total_raised(&self, campaign: CampaignId) -> Result<Amount, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        sum_live(&state, campaign, None)
    }

    fn live_total(
        &self,
        campaign: CampaignId,
        contributor: AccountId,
    ) -> Result<Amount, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        sum_live(&state, campaign, Some(contributor))
    }

    fn contributions(&self, campaign: CampaignId) -> Result<Vec<Contribution>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .by_campaign
            .get(&campaign)
            .map(|indices| indices.iter().map(|&i| state.entries[i].clone()).collect())
            .unwrap_or_default())
    }

    fn contribution_count(&self, campaign: CampaignId) -> Result<u64, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .by_campaign
            .get(&campaign)
            .map(|indices| indices.len() as u64)
            .unwrap_or(0))
    }
}

fn sum_live(
    state: &LedgerState,
    campaign: CampaignId,
    contributor: Option<AccountId>,
) -> Result<Amount, LedgerError> {
    let Some(indices) = state.by_campaign.get(&campaign) else {
        return Ok(Amount::ZERO);
    };

    let mut total = Amount::ZERO;
    for &index in indices {
        let entry = &state.entries[index];
        if !entry.is_live() {
            continue;
        }
        if let Some(who) = contributor {
            if entry.contributor != who {
                continue;
            }
        }
        total = total
            .checked_add(entry.amount)
            .ok_or(LedgerError::AmountOverflow)?;
    }
    Ok(total)
}
