use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;
use crate::money::Amount;
use crate::CampaignId;

/// Unique identifier for a settlement instruction.
///
/// UUID v7, so instruction ids sort roughly by emission time. The id is
/// the idempotency key for the settlement authority: a retried external
/// transfer with the same id must never double-pay.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstructionId(Uuid);

impl InstructionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstructionId({})", self.0)
    }
}

/// Direction of an approved transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// Full raised amount to the campaign creator after success.
    Payout,
    /// A contributor's live total back to them after failure.
    Refund,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Payout => write!(f, "payout"),
            TransferKind::Refund => write!(f, "refund"),
        }
    }
}

/// A monetary transfer the lifecycle engine has already validated.
///
/// The settlement authority executes these against external custody
/// verbatim; it never re-decides amounts or eligibility.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInstruction {
    pub id: InstructionId,
    pub campaign: CampaignId,
    pub recipient: AccountId,
    pub amount: Amount,
    pub kind: TransferKind,
}

impl SettlementInstruction {
    pub fn payout(campaign: CampaignId, recipient: AccountId, amount: Amount) -> Self {
        Self {
            id: InstructionId::new(),
            campaign,
            recipient,
            amount,
            kind: TransferKind::Payout,
        }
    }

    pub fn refund(campaign: CampaignId, recipient: AccountId, amount: Amount) -> Self {
        Self {
            id: InstructionId::new(),
            campaign,
            recipient,
            amount,
            kind: TransferKind::Refund,
        }
    }
}
