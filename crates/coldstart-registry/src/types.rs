use serde::{Deserialize, Serialize};

use coldstart_types::{AccountId, Amount, CampaignId, CampaignStatus, Timestamp};

/// A funding request with a goal, deadline, and accumulated contributions.
///
/// `amount_raised` is a cached aggregate maintained transactionally with
/// ledger writes; the ledger's live sum is authoritative and must always
/// agree. Everything except `amount_raised` and `status` is immutable
/// after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub creator: AccountId,
    pub name: String,
    pub description: String,
    pub goal: Amount,
    pub deadline: Timestamp,
    pub amount_raised: Amount,
    pub status: CampaignStatus,
}

impl Campaign {
    /// Whether the goal has been met by the current aggregate.
    pub fn goal_met(&self) -> bool {
        self.amount_raised >= self.goal
    }

    /// Funding progress as a whole percentage, capped at 100 for display.
    pub fn percent_funded(&self) -> u8 {
        if self.goal.is_zero() {
            return 100;
        }
        let percent = self
            .amount_raised
            .raw()
            .saturating_mul(100)
            .checked_div(self.goal.raw())
            .unwrap_or(0);
        percent.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(raised: u128, goal: u128) -> Campaign {
        Campaign {
            id: 0,
            creator: AccountId::from_bytes([1; 20]),
            name: "test".into(),
            description: String::new(),
            goal: Amount::new(goal),
            deadline: Timestamp::from_unix(1_000),
            amount_raised: Amount::new(raised),
            status: CampaignStatus::Ongoing,
        }
    }

    #[test]
    fn percent_funded_caps_at_100() {
        assert_eq!(campaign(0, 100).percent_funded(), 0);
        assert_eq!(campaign(55, 100).percent_funded(), 55);
        assert_eq!(campaign(110, 100).percent_funded(), 100);
    }

    #[test]
    fn goal_met_is_inclusive() {
        assert!(campaign(100, 100).goal_met());
        assert!(!campaign(99, 100).goal_met());
    }
}
