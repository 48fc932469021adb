//! Proposal records, tally types, and governance parameters.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::{ActionError, GovAction};
use super::traits::ProposalId;

/// Lifecycle status. Transitions are forward-only; no proposal re-enters
/// the deposit period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Collecting deposits; queued by deposit deadline.
    DepositPeriod,
    /// Collecting votes; queued by voting deadline.
    VotingPeriod,
    /// Tally passed and the action batch executed in full.
    Passed,
    /// Tally did not pass.
    Rejected,
    /// Tally passed but the action batch could not be executed.
    Failed,
    /// Deleted without reaching the minimum deposit.
    Removed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalStatus::DepositPeriod => "deposit period",
            ProposalStatus::VotingPeriod => "voting period",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Failed => "failed",
            ProposalStatus::Removed => "removed",
        };
        write!(f, "{}", name)
    }
}

/// Aggregated vote counts (only counts, never individual voters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
}

impl TallyResult {
    pub fn total_voters(&self) -> u64 {
        self.approve + self.reject + self.abstain
    }
}

/// Outcome of tallying one proposal. Produced fresh each time a proposal
/// is finalized; never persisted or cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyOutcome {
    pub passes: bool,
    pub burn_deposits: bool,
    pub result: TallyResult,
}

/// Effective governance parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovParams {
    /// Minimum deposit to enter the voting period.
    pub min_deposit: u128,
    /// Higher floor for expedited proposals.
    pub expedited_min_deposit: u128,
    /// Regular voting window; also the window a converted expedited
    /// proposal restarts under.
    pub voting_period: Duration,
    /// Shortened window for expedited proposals.
    pub expedited_voting_period: Duration,
    /// Burn (instead of refund) deposits of proposals dropped before the
    /// voting period.
    pub burn_proposal_deposit_prevote: bool,
}

impl Default for GovParams {
    fn default() -> Self {
        Self {
            min_deposit: 10_000_000,
            expedited_min_deposit: 50_000_000,
            voting_period: Duration::from_secs(172_800), // 48 hours
            expedited_voting_period: Duration::from_secs(86_400), // 24 hours
            burn_proposal_deposit_prevote: false,
        }
    }
}

/// A unit of collective decision-making: an action batch, a deposit, and
/// a vote-driven outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub proposer: String,
    /// Encoded action batch. Opaque and immutable once stored; decoded
    /// only when a passed proposal is executed.
    pub actions: Vec<u8>,
    pub status: ProposalStatus,
    /// May flip true -> false exactly once (conversion to regular),
    /// never false -> true.
    pub expedited: bool,
    pub submit_time: u64,
    /// Inactive queue key.
    pub deposit_end_time: u64,
    pub voting_start_time: Option<u64>,
    /// Active queue key; absent while in the deposit period.
    pub voting_end_time: Option<u64>,
    pub total_deposit: u128,
    /// Written on the terminal pass through the finalizer, and on
    /// expedited conversion for audit.
    pub final_tally_result: Option<TallyResult>,
}

impl Proposal {
    /// Encode an action batch for storage.
    pub fn encode_actions(actions: &[GovAction]) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(actions)
    }

    /// Decode the stored action batch.
    ///
    /// A batch that fails to decode finalizes the proposal as Failed,
    /// exactly like an action failing during execution.
    pub fn decode_actions(&self) -> Result<Vec<GovAction>, ActionError> {
        Ok(serde_json::from_slice(&self.actions)?)
    }

    /// Effective minimum deposit: expedited proposals carry a higher floor.
    pub fn min_deposit(&self, params: &GovParams) -> u128 {
        if self.expedited {
            params.expedited_min_deposit
        } else {
            params.min_deposit
        }
    }
}
