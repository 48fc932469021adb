//! In-memory collaborators for testing.
//!
//! Provides a full `ProposalStore` plus scripted tally and recording hooks,
//! so every engine path can be driven without a real chain underneath.
//! `MemoryGovStore` is deliberately strict: disposing deposits twice, or
//! touching a queue entry that is not there, is a storage error rather
//! than a no-op, so invariant violations surface in tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use super::proposal::{GovParams, Proposal, ProposalStatus, TallyOutcome};
use super::traits::{
    GovHooks, ProposalId, ProposalStore, StoreError, TallyError, TallyEvaluator,
};

/// A single depositor's stake against a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub depositor: String,
    pub amount: u128,
}

/// In-memory proposal store with deterministic queue ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryGovStore {
    proposals: BTreeMap<ProposalId, Proposal>,
    inactive_queue: BTreeSet<(u64, ProposalId)>,
    active_queue: BTreeSet<(u64, ProposalId)>,
    /// Present until disposed; disposal removes the entry, so a second
    /// disposal is an error.
    deposits: BTreeMap<ProposalId, Vec<Deposit>>,
    /// Balances credited by refunds.
    balances: BTreeMap<String, u128>,
    burned: u128,
    params: GovParams,
}

impl MemoryGovStore {
    pub fn new(params: GovParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Insert a proposal, routing it into the queue its status implies.
    pub fn add_proposal(&mut self, proposal: Proposal, deposits: Vec<Deposit>) {
        match proposal.status {
            ProposalStatus::DepositPeriod => {
                self.inactive_queue
                    .insert((proposal.deposit_end_time, proposal.id));
            }
            ProposalStatus::VotingPeriod => {
                let end = proposal
                    .voting_end_time
                    .expect("voting-period proposal must have an end time");
                self.active_queue.insert((end, proposal.id));
            }
            _ => {}
        }
        self.deposits.insert(proposal.id, deposits);
        self.proposals.insert(proposal.id, proposal);
    }

    pub fn set_params(&mut self, params: GovParams) {
        self.params = params;
    }

    // Assertion accessors

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn deposits(&self, id: ProposalId) -> Option<&[Deposit]> {
        self.deposits.get(&id).map(Vec::as_slice)
    }

    pub fn balance(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn burned(&self) -> u128 {
        self.burned
    }

    pub fn in_inactive_queue(&self, id: ProposalId) -> bool {
        self.inactive_queue.iter().any(|(_, qid)| *qid == id)
    }

    pub fn in_active_queue(&self, id: ProposalId) -> bool {
        self.active_queue.iter().any(|(_, qid)| *qid == id)
    }

    fn take_deposits(&mut self, id: ProposalId) -> Result<Vec<Deposit>, StoreError> {
        self.deposits
            .remove(&id)
            .ok_or(StoreError::DepositsAlreadyDisposed(id))
    }

    fn due(
        queue: &BTreeSet<(u64, ProposalId)>,
        proposals: &BTreeMap<ProposalId, Proposal>,
        cutoff: u64,
    ) -> Result<Vec<Proposal>, StoreError> {
        queue
            .range(..=(cutoff, ProposalId(u64::MAX)))
            .map(|(_, id)| {
                proposals
                    .get(id)
                    .cloned()
                    .ok_or(StoreError::ProposalNotFound(*id))
            })
            .collect()
    }
}

impl ProposalStore for MemoryGovStore {
    fn inactive_due(&self, cutoff: u64) -> Result<Vec<Proposal>, StoreError> {
        Self::due(&self.inactive_queue, &self.proposals, cutoff)
    }

    fn active_due(&self, cutoff: u64) -> Result<Vec<Proposal>, StoreError> {
        Self::due(&self.active_queue, &self.proposals, cutoff)
    }

    fn delete_proposal(&mut self, id: ProposalId) -> Result<(), StoreError> {
        let proposal = self
            .proposals
            .remove(&id)
            .ok_or(StoreError::ProposalNotFound(id))?;

        self.inactive_queue.remove(&(proposal.deposit_end_time, id));
        if let Some(end) = proposal.voting_end_time {
            self.active_queue.remove(&(end, id));
        }
        Ok(())
    }

    fn set_proposal(&mut self, proposal: Proposal) -> Result<(), StoreError> {
        self.proposals.insert(proposal.id, proposal);
        Ok(())
    }

    fn remove_from_active_queue(
        &mut self,
        id: ProposalId,
        end_time: u64,
    ) -> Result<(), StoreError> {
        if !self.active_queue.remove(&(end_time, id)) {
            return Err(StoreError::NotInQueue(id));
        }
        Ok(())
    }

    fn insert_active_queue(&mut self, id: ProposalId, end_time: u64) -> Result<(), StoreError> {
        self.active_queue.insert((end_time, id));
        Ok(())
    }

    fn refund_deposits(&mut self, id: ProposalId) -> Result<(), StoreError> {
        for deposit in self.take_deposits(id)? {
            *self.balances.entry(deposit.depositor).or_insert(0) += deposit.amount;
        }
        Ok(())
    }

    fn burn_deposits(&mut self, id: ProposalId) -> Result<(), StoreError> {
        for deposit in self.take_deposits(id)? {
            self.burned += deposit.amount;
        }
        Ok(())
    }

    fn params(&self) -> Result<GovParams, StoreError> {
        Ok(self.params.clone())
    }
}

/// Scripted tally outcomes keyed by proposal id. A proposal with no
/// scripted outcome tallies with a fatal `MissingVotingState`.
#[derive(Debug, Clone, Default)]
pub struct FixedTally {
    outcomes: BTreeMap<ProposalId, TallyOutcome>,
}

impl FixedTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ProposalId, outcome: TallyOutcome) -> Self {
        self.outcomes.insert(id, outcome);
        self
    }

    pub fn set(&mut self, id: ProposalId, outcome: TallyOutcome) {
        self.outcomes.insert(id, outcome);
    }
}

impl TallyEvaluator for FixedTally {
    fn tally(&self, proposal: &Proposal) -> Result<TallyOutcome, TallyError> {
        self.outcomes
            .get(&proposal.id)
            .cloned()
            .ok_or(TallyError::MissingVotingState(proposal.id))
    }
}

/// Hook observations in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    FailedMinDeposit(ProposalId),
    VotingPeriodEnded(ProposalId),
}

/// Records every hook notification. Clones share the same log, so one
/// clone can be registered with the engine while another asserts.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    calls: Rc<RefCell<Vec<HookCall>>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }
}

impl GovHooks for RecordingHooks {
    fn on_proposal_failed_min_deposit(&mut self, id: ProposalId) {
        self.calls.borrow_mut().push(HookCall::FailedMinDeposit(id));
    }

    fn on_proposal_voting_period_ended(&mut self, id: ProposalId) {
        self.calls.borrow_mut().push(HookCall::VotingPeriodEnded(id));
    }
}
