use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use coldstart_types::{InstructionId, SettlementInstruction};

use crate::custody::{CustodyError, FundsCustody};
use crate::error::SettlementError;

/// Retry policy for transient custody failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts per instruction, the first included.
    pub max_attempts: u32,
    /// Base backoff; attempt `n` waits `n * base_backoff`.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(50),
        }
    }
}

/// Final disposition of one settlement instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Custody acknowledged the transfer.
    Completed { attempts: u32 },
    /// The transfer did not go through; requires operator or retry-policy
    /// intervention. The engine's state transition stands regardless.
    Failed { attempts: u32, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Disposition {
    InFlight,
    Settled(SettlementStatus),
}

/// Executes engine-approved transfers against external custody.
///
/// Execution is at-most-once per instruction id: resubmitting an already
/// settled instruction returns the recorded status without touching
/// custody again, so a caller-side retry can never double-pay.
pub struct SettlementAuthority {
    custody: Arc<dyn FundsCustody>,
    policy: RetryPolicy,
    dispositions: RwLock<HashMap<InstructionId, Disposition>>,
}

impl SettlementAuthority {
    pub fn new(custody: Arc<dyn FundsCustody>, policy: RetryPolicy) -> Self {
        Self {
            custody,
            policy,
            dispositions: RwLock::new(HashMap::new()),
        }
    }

    /// Execute one instruction.
    ///
    /// Returns the recorded status if the instruction has already settled,
    /// fails with `AlreadyInFlight` if a concurrent execution holds it,
    /// and otherwise drives the custody transfer under the retry policy.
    pub async fn execute(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<SettlementStatus, SettlementError> {
        if let Some(recorded) = self.claim(instruction.id)? {
            return Ok(recorded);
        }
        // If this future is dropped mid-retry (caller timeout or
        // cancellation), the guard releases the in-flight mark so a
        // resubmit can run instead of failing `AlreadyInFlight` forever.
        let mut guard = InFlightGuard {
            authority: self,
            id: instruction.id,
            armed: true,
        };

        let mut attempts = 0u32;
        let status = loop {
            attempts += 1;
            match self.custody.transfer(instruction).await {
                Ok(()) => {
                    info!(
                        instruction = %instruction.id,
                        campaign = instruction.campaign,
                        kind = %instruction.kind,
                        amount = %instruction.amount,
                        attempts,
                        "transfer settled"
                    );
                    break SettlementStatus::Completed { attempts };
                }
                Err(CustodyError::Rejected(reason)) => {
                    warn!(
                        instruction = %instruction.id,
                        attempts,
                        reason = %reason,
                        "transfer rejected by custody"
                    );
                    break SettlementStatus::Failed { attempts, reason };
                }
                Err(CustodyError::Unavailable(reason)) => {
                    if attempts >= self.policy.max_attempts {
                        warn!(
                            instruction = %instruction.id,
                            attempts,
                            reason = %reason,
                            "transfer failed; retry budget exhausted"
                        );
                        break SettlementStatus::Failed { attempts, reason };
                    }
                    warn!(
                        instruction = %instruction.id,
                        attempt = attempts,
                        reason = %reason,
                        "custody unavailable; backing off"
                    );
                    tokio::time::sleep(self.policy.base_backoff * attempts).await;
                }
            }
        };

        self.record(instruction.id, status.clone())?;
        guard.armed = false;
        Ok(status)
    }

    /// The recorded status of an instruction, if it has settled.
    pub fn status(&self, id: InstructionId) -> Result<Option<SettlementStatus>, SettlementError> {
        let dispositions = self
            .dispositions
            .read()
            .map_err(|_| SettlementError::LockPoisoned)?;
        Ok(match dispositions.get(&id) {
            Some(Disposition::Settled(status)) => Some(status.clone()),
            _ => None,
        })
    }

    /// Instructions that ended `Failed`, for operator tooling.
    pub fn failed_instructions(&self) -> Result<Vec<InstructionId>, SettlementError> {
        let dispositions = self
            .dispositions
            .read()
            .map_err(|_| SettlementError::LockPoisoned)?;
        Ok(dispositions
            .iter()
            .filter_map(|(id, disposition)| match disposition {
                Disposition::Settled(SettlementStatus::Failed { .. }) => Some(*id),
                _ => None,
            })
            .collect())
    }

    /// Claim an instruction id for execution. Returns the recorded status
    /// if the id already settled (the caller must not re-execute), fails
    /// if a concurrent execution holds it, and marks it in flight
    /// otherwise. The check and the mark happen under one write lock.
    fn claim(&self, id: InstructionId) -> Result<Option<SettlementStatus>, SettlementError> {
        let mut dispositions = self
            .dispositions
            .write()
            .map_err(|_| SettlementError::LockPoisoned)?;
        match dispositions.get(&id) {
            Some(Disposition::InFlight) => Err(SettlementError::AlreadyInFlight(id)),
            Some(Disposition::Settled(status)) => Ok(Some(status.clone())),
            None => {
                dispositions.insert(id, Disposition::InFlight);
                Ok(None)
            }
        }
    }

    fn record(&self, id: InstructionId, status: SettlementStatus) -> Result<(), SettlementError> {
        let mut dispositions = self
            .dispositions
            .write()
            .map_err(|_| SettlementError::LockPoisoned)?;
        dispositions.insert(id, Disposition::Settled(status));
        Ok(())
    }
}

/// Clears an instruction's in-flight mark unless execution recorded a
/// final status first.
struct InFlightGuard<'a> {
    authority: &'a SettlementAuthority,
    id: InstructionId,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut dispositions) = self.authority.dispositions.write() {
            if let Some(Disposition::InFlight) = dispositions.get(&self.id) {
                dispositions.remove(&self.id);
            }
        }
    }
}
