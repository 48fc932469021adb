//! Proposal finalization engine.
//!
//! Run once per block, in two passes:
//! 1. Reap deposit-period proposals whose deposit deadline passed without
//!    reaching the minimum deposit (delete, dispose deposits, notify).
//! 2. Finalize voting-period proposals whose deadline passed: tally,
//!    dispose deposits, execute the approved action batch atomically, and
//!    persist the terminal status. A failed expedited proposal is instead
//!    converted to regular and re-queued under the extended deadline.
//!
//! The store, tally, and action router are consumed through the traits in
//! [`traits`]; in-memory doubles for all of them live in [`mock`].

pub mod action;
pub mod events;
pub mod executor;
pub mod lifecycle;
pub mod mock;
pub mod overlay;
pub mod proposal;
pub mod traits;

#[cfg(test)]
mod proptests;

pub use action::{ActionError, GovAction, GovRouter};
pub use events::{Event, EventManager};
pub use executor::{execute_batch, ExecError};
pub use lifecycle::GovEngine;
pub use overlay::{KvState, StateOverlay};
pub use proposal::{GovParams, Proposal, ProposalStatus, TallyOutcome, TallyResult};
pub use traits::{
    ActionDispatcher, GovError, GovHooks, GovResult, ProposalId, ProposalStore, StoreError,
    TallyError, TallyEvaluator,
};
