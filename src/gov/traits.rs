//! Collaborator trait abstractions.
//!
//! The engine never touches persistence, vote counting, or action handlers
//! directly; it consumes them through these seams. The traits enable full
//! coverage via the in-memory doubles in [`super::mock`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::{ActionError, GovAction};
use super::events::Event;
use super::overlay::StateOverlay;
use super::proposal::{GovParams, Proposal, TallyOutcome};

/// Proposal identifier, assigned monotonically at submission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type for engine operations.
pub type GovResult<T> = Result<T, GovError>;

/// Storage-layer errors. Always fatal: any of these aborts the remainder
/// of the block invocation, since continuing would risk replica divergence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} not present in queue")]
    NotInQueue(ProposalId),

    #[error("deposits for proposal {0} already disposed")]
    DepositsAlreadyDisposed(ProposalId),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Tally evaluation errors. Fatal for the same reason as [`StoreError`]:
/// a proposal that cannot be tallied is an integrity failure, not a vote
/// outcome.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("no voting state recorded for proposal {0}")]
    MissingVotingState(ProposalId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fatal engine errors surfaced to the caller of `end_block`.
#[derive(Debug, thiserror::Error)]
pub enum GovError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("tally: {0}")]
    Tally(#[from] TallyError),
}

/// Proposal and deposit persistence, including the two deadline queues.
///
/// Queue listings must be in ascending `(deadline, id)` order - the order
/// every replica shares. Deposit disposal is per proposal and must be
/// performed at most once: a second disposal is a storage error, never a
/// silent no-op.
pub trait ProposalStore {
    /// Deposit-period proposals whose deposit deadline is <= `cutoff`.
    fn inactive_due(&self, cutoff: u64) -> Result<Vec<Proposal>, StoreError>;

    /// Voting-period proposals whose voting deadline is <= `cutoff`.
    fn active_due(&self, cutoff: u64) -> Result<Vec<Proposal>, StoreError>;

    /// Delete a proposal record and its queue entries.
    fn delete_proposal(&mut self, id: ProposalId) -> Result<(), StoreError>;

    /// Persist a proposal record (upsert).
    fn set_proposal(&mut self, proposal: Proposal) -> Result<(), StoreError>;

    /// Remove a proposal's entry under its old deadline key.
    fn remove_from_active_queue(&mut self, id: ProposalId, end_time: u64)
        -> Result<(), StoreError>;

    /// Queue a proposal under a new voting deadline.
    fn insert_active_queue(&mut self, id: ProposalId, end_time: u64) -> Result<(), StoreError>;

    /// Return all deposits to their depositors.
    fn refund_deposits(&mut self, id: ProposalId) -> Result<(), StoreError>;

    /// Destroy all deposits.
    fn burn_deposits(&mut self, id: ProposalId) -> Result<(), StoreError>;

    /// Effective governance parameters.
    fn params(&self) -> Result<GovParams, StoreError>;
}

/// Vote aggregation. Pure function of stored state: the engine calls it
/// exactly once per finalized proposal and never caches the outcome.
pub trait TallyEvaluator {
    fn tally(&self, proposal: &Proposal) -> Result<TallyOutcome, TallyError>;
}

/// Routes one action to its handler against the overlay.
///
/// Success returns the action's side-effect events in emission order.
/// Failure is a business-logic rejection; the executor reports it with the
/// action's batch position and discards the overlay.
pub trait ActionDispatcher {
    fn dispatch(
        &self,
        state: &mut StateOverlay<'_>,
        action: &GovAction,
    ) -> Result<Vec<Event>, ActionError>;
}

/// Lifecycle observers. A fixed set of typed callbacks registered at
/// engine construction; notification order is registration order.
/// Fire-and-forget: no return value is consumed.
pub trait GovHooks {
    /// Proposal deleted without reaching the minimum deposit.
    fn on_proposal_failed_min_deposit(&mut self, _id: ProposalId) {}

    /// Proposal left the voting period (finalized or converted).
    fn on_proposal_voting_period_ended(&mut self, _id: ProposalId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_id_display() {
        assert_eq!(ProposalId(42).to_string(), "42");
    }

    #[test]
    fn test_proposal_id_ordering() {
        assert!(ProposalId(1) < ProposalId(2));
        assert_eq!(ProposalId(7), ProposalId(7));
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::ProposalNotFound(ProposalId(9));
        assert_eq!(err.to_string(), "proposal 9 not found");

        let err = StoreError::DepositsAlreadyDisposed(ProposalId(3));
        assert_eq!(err.to_string(), "deposits for proposal 3 already disposed");
    }

    #[test]
    fn test_gov_error_wraps_store_error() {
        let err: GovError = StoreError::NotInQueue(ProposalId(1)).into();
        assert!(matches!(err, GovError::Store(_)));
        assert_eq!(err.to_string(), "store: proposal 1 not present in queue");
    }
}
