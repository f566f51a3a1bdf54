use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use coldstart_ledger::{Contribution, LedgerError, LedgerReader, LedgerWriter};
use coldstart_registry::{Campaign, CampaignIter, CampaignMutator, CampaignStore, RegistryError};
use coldstart_types::{
    AccountId, Amount, CampaignId, CampaignStatus, Clock, SettlementInstruction, Timestamp,
};

use crate::error::EngineError;

/// The campaign lifecycle state machine.
///
/// Owns the registry and ledger and is the single writer for both:
/// `status` and `amount_raised` change only through the intents below.
/// Each intent targeting a campaign runs under that campaign's lock, so
/// the read-then-write across the two stores is serialized per campaign
/// while different campaigns proceed fully in parallel.
pub struct LifecycleEngine<S, L, C> {
    registry: S,
    ledger: L,
    clock: C,
    locks: Mutex<HashMap<CampaignId, Arc<Mutex<()>>>>,
}

impl<S, L, C> LifecycleEngine<S, L, C>
where
    S: CampaignStore + CampaignMutator,
    L: LedgerWriter + LedgerReader,
    C: Clock,
{
    pub fn new(registry: S, ledger: L, clock: C) -> Self {
        Self {
            registry,
            ledger,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The injected time source.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Direct read access to the ledger, for audit tooling.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ---- Intents ----

    /// Create a new campaign. Validation (positive goal, future deadline,
    /// non-empty name) happens in the registry against the injected clock.
    pub fn create(
        &self,
        creator: AccountId,
        name: &str,
        description: &str,
        goal: Amount,
        deadline: Timestamp,
    ) -> Result<Campaign, EngineError> {
        let now = self.clock.now();
        let campaign = self
            .registry
            .create(creator, name, description, goal, deadline, now)?;
        Ok(campaign)
    }

    /// Contribute `amount` to an ongoing campaign before its deadline.
    ///
    /// The deadline check is strict: a contribution submitted at exactly
    /// `deadline` is rejected. Returns the campaign with its updated
    /// aggregate.
    pub fn contribute(
        &self,
        id: CampaignId,
        contributor: AccountId,
        amount: Amount,
    ) -> Result<Campaign, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let campaign = self.registry.get(id)?;
        let now = self.clock.now();
        if !campaign.status.is_ongoing() || now >= campaign.deadline {
            return Err(EngineError::CampaignClosed { campaign: id });
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount.into());
        }
        // Headroom check up front: once the ledger record is written, the
        // aggregate update must not be able to fail, or the two stores
        // would disagree forever.
        if campaign.amount_raised.checked_add(amount).is_none() {
            return Err(RegistryError::RaisedOverflow(id).into());
        }

        self.ledger
            .record(Contribution::new(id, contributor, amount, now))?;
        let raised = self.registry.add_raised(id, amount)?;

        debug!(
            campaign = id,
            contributor = %contributor.short_id(),
            amount = %amount,
            raised = %raised,
            "contribution accepted"
        );
        self.registry.get(id).map_err(EngineError::from)
    }

    /// Finalize a campaign whose deadline has passed.
    ///
    /// Decides `Successful` iff the aggregate met the goal at this moment,
    /// `Failed` otherwise. A second call fails with `AlreadyFinalized`
    /// rather than silently succeeding, surfacing caller bugs.
    pub fn finalize(&self, id: CampaignId) -> Result<CampaignStatus, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let campaign = self.registry.get(id)?;
        if !campaign.status.is_ongoing() {
            return Err(EngineError::AlreadyFinalized {
                campaign: id,
                status: campaign.status,
            });
        }
        let now = self.clock.now();
        if now < campaign.deadline {
            return Err(EngineError::TooEarly {
                campaign: id,
                deadline: campaign.deadline,
                now,
            });
        }

        let decided = if campaign.goal_met() {
            CampaignStatus::Successful
        } else {
            CampaignStatus::Failed
        };
        self.registry.set_status(id, decided)?;

        info!(
            campaign = id,
            raised = %campaign.amount_raised,
            goal = %campaign.goal,
            status = %decided,
            "campaign finalized"
        );
        Ok(decided)
    }

    /// Withdraw the full raised amount of a successful campaign.
    ///
    /// Only the creator may withdraw, and only once: the campaign moves to
    /// `PaidOut` and the returned payout instruction is the caller's to
    /// forward to the settlement authority. The transition is optimistic:
    /// a failed external transfer surfaces through settlement status, never
    /// by rolling the campaign back.
    pub fn withdraw(
        &self,
        id: CampaignId,
        caller: AccountId,
    ) -> Result<SettlementInstruction, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let campaign = self.registry.get(id)?;
        if caller != campaign.creator {
            return Err(EngineError::NotCreator {
                campaign: id,
                caller,
            });
        }
        match campaign.status {
            CampaignStatus::Successful => {}
            CampaignStatus::PaidOut => {
                return Err(EngineError::CampaignClosed { campaign: id });
            }
            status => {
                return Err(EngineError::NotSuccessful {
                    campaign: id,
                    status,
                });
            }
        }

        self.registry.set_status(id, CampaignStatus::PaidOut)?;
        let instruction =
            SettlementInstruction::payout(id, campaign.creator, campaign.amount_raised);

        info!(
            campaign = id,
            instruction = %instruction.id,
            amount = %instruction.amount,
            "payout instruction emitted"
        );
        Ok(instruction)
    }

    /// Refund a contributor's live total on a failed campaign.
    ///
    /// Marks the contributor's live contributions refunded, decrements the
    /// aggregate by exactly the refunded total, and returns the refund
    /// instruction. The campaign stays `Failed` even when fully refunded.
    pub fn refund(
        &self,
        id: CampaignId,
        contributor: AccountId,
    ) -> Result<SettlementInstruction, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let campaign = self.registry.get(id)?;
        match campaign.status {
            CampaignStatus::Failed => {}
            CampaignStatus::PaidOut => {
                return Err(EngineError::CampaignClosed { campaign: id });
            }
            status => {
                return Err(EngineError::NotFailed {
                    campaign: id,
                    status,
                });
            }
        }

        let refunded = self.ledger.mark_refunded(id, contributor)?;
        self.registry.sub_raised(id, refunded)?;
        let instruction = SettlementInstruction::refund(id, contributor, refunded);

        info!(
            campaign = id,
            instruction = %instruction.id,
            contributor = %contributor.short_id(),
            amount = %refunded,
            "refund instruction emitted"
        );
        Ok(instruction)
    }

    // ---- Reads ----

    /// Fetch one campaign. Does not take the campaign lock, so the cached
    /// aggregate may trail an in-flight intent.
    pub fn campaign(&self, id: CampaignId) -> Result<Campaign, EngineError> {
        self.registry.get(id).map_err(EngineError::from)
    }

    /// Lazy sequence of all campaigns in creation order.
    pub fn campaigns(&self) -> Result<CampaignIter<'_, S>, EngineError> {
        self.registry.list().map_err(EngineError::from)
    }

    /// Strongly consistent live total for a campaign, read from the ledger
    /// under the campaign's serialization point.
    pub fn consistent_total(&self, id: CampaignId) -> Result<Amount, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;
        self.ledger.total_raised(id).map_err(EngineError::from)
    }

    /// Check the registry's cached aggregate against the ledger's live sum.
    ///
    /// The ledger is authoritative; a mismatch means a bug in the engine's
    /// transactional updates and is returned as `OutOfBalance`.
    pub fn reconcile(&self, id: CampaignId) -> Result<Amount, EngineError> {
        let lock = self.lock_for(id)?;
        let _guard = lock.lock().map_err(|_| EngineError::LockPoisoned)?;

        let cached = self.registry.get(id)?.amount_raised;
        let ledger = self.ledger.total_raised(id)?;
        if cached != ledger {
            return Err(EngineError::OutOfBalance {
                campaign: id,
                cached,
                ledger,
            });
        }
        Ok(cached)
    }

    fn lock_for(&self, id: CampaignId) -> Result<Arc<Mutex<()>>, EngineError> {
        let mut locks = self.locks.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(locks.entry(id).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldstart_ledger::InMemoryLedger;
    use coldstart_registry::{InMemoryRegistry, RegistryError};
    use coldstart_types::{ManualClock, Timestamp, TransferKind};

    const T0: Timestamp = Timestamp::from_unix(1_000);
    const DEADLINE: Timestamp = Timestamp::from_unix(2_000);

    type TestEngine = LifecycleEngine<InMemoryRegistry, InMemoryLedger, ManualClock>;

    fn engine() -> TestEngine {
        LifecycleEngine::new(
            InMemoryRegistry::new(),
            InMemoryLedger::new(),
            ManualClock::at(T0),
        )
    }

    fn creator() -> AccountId {
        AccountId::from_bytes([0xc0; 20])
    }

    fn backer(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 20])
    }

    fn create_campaign(engine: &TestEngine, goal: u128) -> CampaignId {
        engine
            .create(creator(), "launch", "a story", Amount::new(goal), DEADLINE)
            .unwrap()
            .id
    }

    #[test]
    fn create_validates_against_injected_clock() {
        let engine = engine();
        let error = engine
            .create(creator(), "late", "", Amount::new(1), T0)
            .unwrap_err();
        assert_eq!(
            error,
            EngineError::Registry(RegistryError::InvalidDeadline {
                deadline: T0,
                now: T0
            })
        );
    }

    #[test]
    fn contribute_updates_cached_aggregate() {
        let engine = engine();
        let id = create_campaign(&engine, 100);

        let campaign = engine.contribute(id, backer(1), Amount::new(40)).unwrap();
        assert_eq!(campaign.amount_raised, Amount::new(40));

        let campaign = engine.contribute(id, backer(2), Amount::new(70)).unwrap();
        assert_eq!(campaign.amount_raised, Amount::new(110));

        assert_eq!(engine.reconcile(id).unwrap(), Amount::new(110));
        assert_eq!(engine.consistent_total(id).unwrap(), Amount::new(110));
    }

    #[test]
    fn contribute_rejects_zero_amount_without_mutation() {
        let engine = engine();
        let id = create_campaign(&engine, 100);

        let error = engine.contribute(id, backer(1), Amount::ZERO).unwrap_err();
        assert_eq!(error, EngineError::Ledger(LedgerError::InvalidAmount));
        assert_eq!(engine.campaign(id).unwrap().amount_raised, Amount::ZERO);
    }

    #[test]
    fn contribute_overflow_leaves_stores_in_agreement() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine
            .contribute(id, backer(1), Amount::new(u128::MAX))
            .unwrap();

        // The aggregate has no headroom left; the intent must fail before
        // anything is written to the ledger.
        let error = engine.contribute(id, backer(2), Amount::new(1)).unwrap_err();
        assert_eq!(
            error,
            EngineError::Registry(RegistryError::RaisedOverflow(id))
        );
        assert_eq!(engine.ledger().contribution_count(id).unwrap(), 1);
        assert_eq!(engine.reconcile(id).unwrap(), Amount::new(u128::MAX));
    }

    #[test]
    fn deadline_check_is_strict() {
        let engine = engine();
        let id = create_campaign(&engine, 100);

        // One second before the deadline is still open.
        engine.clock().set(Timestamp::from_unix(1_999));
        engine.contribute(id, backer(1), Amount::new(5)).unwrap();

        // Exactly at the deadline is closed.
        engine.clock().set(DEADLINE);
        let error = engine.contribute(id, backer(1), Amount::new(5)).unwrap_err();
        assert_eq!(error, EngineError::CampaignClosed { campaign: id });
        assert_eq!(engine.campaign(id).unwrap().amount_raised, Amount::new(5));
    }

    #[test]
    fn contribute_to_finalized_campaign_is_closed() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.clock().set(DEADLINE);
        engine.finalize(id).unwrap();

        // Back-dating the clock does not reopen a finalized campaign.
        engine.clock().set(T0);
        let error = engine.contribute(id, backer(1), Amount::new(5)).unwrap_err();
        assert_eq!(error, EngineError::CampaignClosed { campaign: id });
    }

    #[test]
    fn contribute_to_unknown_campaign_is_not_found() {
        let engine = engine();
        let error = engine.contribute(42, backer(1), Amount::new(5)).unwrap_err();
        assert_eq!(error, EngineError::Registry(RegistryError::NotFound(42)));
    }

    #[test]
    fn finalize_before_deadline_is_too_early() {
        let engine = engine();
        let id = create_campaign(&engine, 100);

        let error = engine.finalize(id).unwrap_err();
        assert_eq!(
            error,
            EngineError::TooEarly {
                campaign: id,
                deadline: DEADLINE,
                now: T0
            }
        );
        assert_eq!(
            engine.campaign(id).unwrap().status,
            CampaignStatus::Ongoing
        );
    }

    #[test]
    fn finalize_decides_success_when_goal_met_exactly() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(100)).unwrap();

        engine.clock().set(DEADLINE);
        assert_eq!(engine.finalize(id).unwrap(), CampaignStatus::Successful);
    }

    #[test]
    fn finalize_twice_fails_and_keeps_first_decision() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(110)).unwrap();

        engine.clock().set(DEADLINE);
        assert_eq!(engine.finalize(id).unwrap(), CampaignStatus::Successful);

        let error = engine.finalize(id).unwrap_err();
        assert_eq!(
            error,
            EngineError::AlreadyFinalized {
                campaign: id,
                status: CampaignStatus::Successful
            }
        );
        assert_eq!(
            engine.campaign(id).unwrap().status,
            CampaignStatus::Successful
        );
    }

    #[test]
    fn withdraw_by_non_creator_changes_nothing() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(110)).unwrap();
        engine.clock().set(DEADLINE);
        engine.finalize(id).unwrap();

        let error = engine.withdraw(id, backer(1)).unwrap_err();
        assert_eq!(
            error,
            EngineError::NotCreator {
                campaign: id,
                caller: backer(1)
            }
        );
        assert_eq!(
            engine.campaign(id).unwrap().status,
            CampaignStatus::Successful
        );
    }

    #[test]
    fn withdraw_before_success_fails() {
        let engine = engine();
        let id = create_campaign(&engine, 100);

        let error = engine.withdraw(id, creator()).unwrap_err();
        assert_eq!(
            error,
            EngineError::NotSuccessful {
                campaign: id,
                status: CampaignStatus::Ongoing
            }
        );
    }

    #[test]
    fn successful_campaign_pays_out_full_raised_amount() {
        // Scenario: goal 100, contributions 40 + 70 before the deadline.
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(40)).unwrap();
        engine.contribute(id, backer(2), Amount::new(70)).unwrap();

        engine.clock().set(DEADLINE);
        assert_eq!(engine.finalize(id).unwrap(), CampaignStatus::Successful);

        let instruction = engine.withdraw(id, creator()).unwrap();
        assert_eq!(instruction.kind, TransferKind::Payout);
        assert_eq!(instruction.campaign, id);
        assert_eq!(instruction.recipient, creator());
        assert_eq!(instruction.amount, Amount::new(110));
        assert_eq!(engine.campaign(id).unwrap().status, CampaignStatus::PaidOut);
    }

    #[test]
    fn paid_out_campaign_is_closed_to_everything() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(110)).unwrap();
        engine.clock().set(DEADLINE);
        engine.finalize(id).unwrap();
        engine.withdraw(id, creator()).unwrap();

        let closed = EngineError::CampaignClosed { campaign: id };
        assert_eq!(engine.withdraw(id, creator()).unwrap_err(), closed);
        assert_eq!(engine.refund(id, backer(1)).unwrap_err(), closed);
        assert_eq!(
            engine
                .contribute(id, backer(1), Amount::new(1))
                .unwrap_err(),
            closed
        );
    }

    #[test]
    fn failed_campaign_refunds_exact_live_totals() {
        // Scenario: goal 100, contributions totaling 60 before the deadline.
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(25)).unwrap();
        engine.contribute(id, backer(1), Amount::new(10)).unwrap();
        engine.contribute(id, backer(2), Amount::new(25)).unwrap();

        engine.clock().set(DEADLINE);
        assert_eq!(engine.finalize(id).unwrap(), CampaignStatus::Failed);

        let instruction = engine.refund(id, backer(1)).unwrap();
        assert_eq!(instruction.kind, TransferKind::Refund);
        assert_eq!(instruction.recipient, backer(1));
        assert_eq!(instruction.amount, Amount::new(35));

        let campaign = engine.campaign(id).unwrap();
        assert_eq!(campaign.amount_raised, Amount::new(25));
        assert_eq!(campaign.status, CampaignStatus::Failed);
        engine.reconcile(id).unwrap();

        // A second refund for the same contributor has nothing left.
        let error = engine.refund(id, backer(1)).unwrap_err();
        assert_eq!(
            error,
            EngineError::Ledger(LedgerError::NothingToRefund {
                campaign: id,
                contributor: backer(1)
            })
        );
        assert_eq!(engine.campaign(id).unwrap().amount_raised, Amount::new(25));
    }

    #[test]
    fn fully_refunded_campaign_stays_failed() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(60)).unwrap();
        engine.clock().set(DEADLINE);
        engine.finalize(id).unwrap();

        engine.refund(id, backer(1)).unwrap();
        let campaign = engine.campaign(id).unwrap();
        assert_eq!(campaign.amount_raised, Amount::ZERO);
        assert_eq!(campaign.status, CampaignStatus::Failed);
    }

    #[test]
    fn refund_on_ongoing_campaign_fails() {
        let engine = engine();
        let id = create_campaign(&engine, 100);
        engine.contribute(id, backer(1), Amount::new(10)).unwrap();

        let error = engine.refund(id, backer(1)).unwrap_err();
        assert_eq!(
            error,
            EngineError::NotFailed {
                campaign: id,
                status: CampaignStatus::Ongoing
            }
        );
    }

    #[test]
    fn campaigns_are_independent() {
        let engine = engine();
        let first = create_campaign(&engine, 100);
        let second = create_campaign(&engine, 50);

        engine.contribute(first, backer(1), Amount::new(110)).unwrap();
        engine.contribute(second, backer(1), Amount::new(10)).unwrap();

        engine.clock().set(DEADLINE);
        assert_eq!(engine.finalize(first).unwrap(), CampaignStatus::Successful);
        assert_eq!(engine.finalize(second).unwrap(), CampaignStatus::Failed);

        assert_eq!(engine.reconcile(first).unwrap(), Amount::new(110));
        assert_eq!(engine.reconcile(second).unwrap(), Amount::new(10));

        let listed: Vec<CampaignId> = engine.campaigns().unwrap().map(|c| c.id).collect();
        assert_eq!(listed, [first, second]);
    }

    #[test]
    fn concurrent_contributions_serialize_per_campaign() {
        let engine = Arc::new(engine());
        let id = create_campaign(&engine, 1_000_000);

        let handles: Vec<_> = (0..8u8)
            .map(|seed| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        engine.contribute(id, backer(seed + 1), Amount::new(3)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.reconcile(id).unwrap(), Amount::new(8 * 50 * 3));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Random contribution/refund sequences never desynchronize
            /// the cached aggregate from the ledger's live sum.
            #[test]
            fn aggregate_always_matches_ledger(
                amounts in prop::collection::vec((1u8..6, 1u128..1_000), 1..30),
                goal in 1u128..20_000,
            ) {
                let engine = engine();
                let id = create_campaign(&engine, goal);

                for (seed, amount) in &amounts {
                    engine.contribute(id, backer(*seed), Amount::new(*amount)).unwrap();
                    engine.reconcile(id).unwrap();
                }

                engine.clock().set(DEADLINE);
                let status = engine.finalize(id).unwrap();
                engine.reconcile(id).unwrap();

                if status == CampaignStatus::Failed {
                    for seed in 1u8..6 {
                        match engine.refund(id, backer(seed)) {
                            Ok(_) => {}
                            Err(EngineError::Ledger(
                                LedgerError::NothingToRefund { .. },
                            )) => {}
                            Err(other) => return Err(TestCaseError::fail(other.to_string())),
                        }
                        engine.reconcile(id).unwrap();
                    }
                    prop_assert_eq!(
                        engine.campaign(id).unwrap().amount_raised,
                        Amount::ZERO
                    );
                }
            }
        }
    }
}
