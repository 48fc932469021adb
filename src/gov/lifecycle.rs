//! Per-block proposal lifecycle: the inactive-proposal reaper and the
//! active-proposal finalizer.
//!
//! Both passes are run-to-completion iterations over the store's due
//! queues. The only time input is the block timestamp, so every replica
//! processing the same block makes the same decisions in the same order.
//! Storage and tally errors abort the remainder of the invocation; action
//! failures only fail the proposal at hand.

use super::events::{
    Event, EventManager, ATTR_PROPOSAL_ID, ATTR_PROPOSAL_LOG, ATTR_PROPOSAL_RESULT,
    RESULT_DROPPED, RESULT_EXPEDITED_REJECTED, RESULT_FAILED, RESULT_PASSED, RESULT_REJECTED,
    TYPE_ACTIVE_PROPOSAL, TYPE_INACTIVE_PROPOSAL,
};
use super::executor::execute_batch;
use super::overlay::KvState;
use super::proposal::ProposalStatus;
use super::traits::{
    ActionDispatcher, GovHooks, GovResult, ProposalStore, StoreError, TallyEvaluator,
};

/// The proposal-finalization engine.
///
/// Owns its collaborators for the duration of a block and retains nothing
/// across blocks beyond what the store persists.
pub struct GovEngine<S, T, D> {
    store: S,
    tally: T,
    router: D,
    hooks: Vec<Box<dyn GovHooks>>,
}

impl<S, T, D> GovEngine<S, T, D>
where
    S: ProposalStore,
    T: TallyEvaluator,
    D: ActionDispatcher,
{
    pub fn new(store: S, tally: T, router: D) -> Self {
        Self {
            store,
            tally,
            router,
            hooks: Vec::new(),
        }
    }

    /// Register a lifecycle observer. Hooks fire in registration order.
    pub fn register_hooks(&mut self, hooks: Box<dyn GovHooks>) {
        self.hooks.push(hooks);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Process one block: drain expired deposit-period proposals, then
    /// finalize proposals whose voting window has closed.
    ///
    /// On a fatal error, events emitted for proposals already processed
    /// remain in `events`, matching whatever the store has already
    /// durably persisted for them.
    pub fn end_block(
        &mut self,
        app: &mut KvState,
        block_time: u64,
        events: &mut EventManager,
    ) -> GovResult<()> {
        self.sweep_inactive(block_time, events)?;
        self.finalize_active(app, block_time, events)
    }

    /// Delete deposit-period proposals whose deposit deadline has passed
    /// without the minimum deposit being reached.
    fn sweep_inactive(&mut self, block_time: u64, events: &mut EventManager) -> GovResult<()> {
        for proposal in self.store.inactive_due(block_time)? {
            self.store.delete_proposal(proposal.id)?;

            let params = self.store.params()?;
            if params.burn_proposal_deposit_prevote {
                self.store.burn_deposits(proposal.id)?;
            } else {
                self.store.refund_deposits(proposal.id)?;
            }

            for hooks in &mut self.hooks {
                hooks.on_proposal_failed_min_deposit(proposal.id);
            }

            events.emit(
                Event::new(TYPE_INACTIVE_PROPOSAL)
                    .attr(ATTR_PROPOSAL_ID, proposal.id.to_string())
                    .attr(ATTR_PROPOSAL_RESULT, RESULT_DROPPED),
            );

            tracing::info!(
                proposal = %proposal.id,
                expedited = proposal.expedited,
                title = %proposal.title,
                min_deposit = %proposal.min_deposit(&params),
                total_deposit = %proposal.total_deposit,
                "proposal did not meet minimum deposit; deleted"
            );
        }

        Ok(())
    }

    /// Tally and conclude proposals whose voting deadline has passed.
    fn finalize_active(
        &mut self,
        app: &mut KvState,
        block_time: u64,
        events: &mut EventManager,
    ) -> GovResult<()> {
        for mut proposal in self.store.active_due(block_time)? {
            let outcome = self.tally.tally(&proposal)?;

            // Deposits are disposed in every case EXCEPT an expedited
            // proposal failing: that one is about to be converted, not
            // concluded, and keeps its deposits.
            if !(proposal.expedited && !outcome.passes) {
                if outcome.burn_deposits {
                    self.store.burn_deposits(proposal.id)?;
                } else {
                    self.store.refund_deposits(proposal.id)?;
                }
            }

            let old_end = proposal.voting_end_time.ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "active proposal {} has no voting end time",
                    proposal.id
                ))
            })?;
            self.store.remove_from_active_queue(proposal.id, old_end)?;

            let tag;
            let log_msg;

            if outcome.passes {
                match proposal.decode_actions() {
                    Ok(actions) => match execute_batch(&self.router, app, &actions) {
                        Ok(batch_events) => {
                            proposal.status = ProposalStatus::Passed;
                            tag = RESULT_PASSED;
                            log_msg = "passed".to_string();
                            events.extend(batch_events);
                        }
                        Err(err) => {
                            proposal.status = ProposalStatus::Failed;
                            tag = RESULT_FAILED;
                            log_msg = format!("passed, but {}", err);
                        }
                    },
                    Err(err) => {
                        proposal.status = ProposalStatus::Failed;
                        tag = RESULT_FAILED;
                        log_msg = format!("passed proposal failed to execute: {}", err);
                    }
                }
            } else if proposal.expedited {
                // A failed expedited proposal is converted to regular: the
                // voting window restarts from the original start under the
                // regular period, and the tally repeats when it expires.
                proposal.expedited = false;

                let params = self.store.params()?;
                let start = proposal.voting_start_time.ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "active proposal {} has no voting start time",
                        proposal.id
                    ))
                })?;
                let new_end = start + params.voting_period.as_secs();
                proposal.voting_end_time = Some(new_end);
                self.store.insert_active_queue(proposal.id, new_end)?;

                tag = RESULT_EXPEDITED_REJECTED;
                log_msg = "expedited proposal converted to regular".to_string();
            } else {
                proposal.status = ProposalStatus::Rejected;
                tag = RESULT_REJECTED;
                log_msg = "rejected".to_string();
            }

            proposal.final_tally_result = Some(outcome.result);
            self.store.set_proposal(proposal.clone())?;

            for hooks in &mut self.hooks {
                hooks.on_proposal_voting_period_ended(proposal.id);
            }

            tracing::info!(
                proposal = %proposal.id,
                status = %proposal.status,
                expedited = proposal.expedited,
                title = %proposal.title,
                results = %log_msg,
                "proposal tallied"
            );

            events.emit(
                Event::new(TYPE_ACTIVE_PROPOSAL)
                    .attr(ATTR_PROPOSAL_ID, proposal.id.to_string())
                    .attr(ATTR_PROPOSAL_RESULT, tag)
                    .attr(ATTR_PROPOSAL_LOG, log_msg),
            );
        }

        Ok(())
    }
}
