//! Property-based tests for the finalization engine.
//!
//! Tests for:
//! - Determinism: same store snapshot and block time produce identical
//!   stores, app state, and event streams
//! - Atomicity: a batch with any failing action leaves the base state
//!   untouched and reports the failing position
//! - Queue/status agreement: after a block, queue membership matches
//!   proposal status exactly

use proptest::prelude::*;

use super::action::{GovAction, GovRouter};
use super::events::EventManager;
use super::executor::execute_batch;
use super::lifecycle::GovEngine;
use super::mock::{Deposit, FixedTally, MemoryGovStore};
use super::overlay::KvState;
use super::proposal::{GovParams, Proposal, ProposalStatus, TallyOutcome, TallyResult};
use super::traits::{ProposalId, ProposalStore};

/// How a generated proposal should fare in the finalizer.
#[derive(Debug, Clone, Copy)]
enum Fate {
    Passes,
    Rejected,
    ExecFails,
    ExpeditedFails,
}

fn fate_strategy() -> impl Strategy<Value = Fate> {
    prop_oneof![
        Just(Fate::Passes),
        Just(Fate::Rejected),
        Just(Fate::ExecFails),
        Just(Fate::ExpeditedFails),
    ]
}

fn valid_action_strategy() -> impl Strategy<Value = GovAction> {
    prop_oneof![
        prop::sample::select(vec!["quorum", "threshold", "min_deposit"]).prop_map(|name| {
            GovAction::ParamChange {
                name: name.to_string(),
                value: "1".to_string(),
            }
        }),
        (prop::sample::select(vec!["alice", "bob"]), 0u128..10).prop_map(
            |(recipient, amount)| GovAction::CommunitySpend {
                recipient: recipient.to_string(),
                amount,
            }
        ),
        Just(GovAction::Text {
            title: "signal".to_string(),
        }),
    ]
}

fn proposal_for(index: usize, fate: Fate) -> Proposal {
    let id = ProposalId(index as u64 + 1);
    let actions = match fate {
        Fate::ExecFails => vec![
            GovAction::Text {
                title: "first".to_string(),
            },
            GovAction::Unsupported,
        ],
        _ => vec![GovAction::ParamChange {
            name: "quorum".to_string(),
            value: "0.5".to_string(),
        }],
    };

    Proposal {
        id,
        title: format!("proposal {}", id),
        proposer: "alice".to_string(),
        actions: Proposal::encode_actions(&actions).expect("encodable actions"),
        status: ProposalStatus::VotingPeriod,
        expedited: matches!(fate, Fate::ExpeditedFails),
        submit_time: 0,
        deposit_end_time: 10,
        voting_start_time: Some(10),
        voting_end_time: Some(100 + (index as u64 % 7)),
        total_deposit: 1_000,
        final_tally_result: None,
    }
}

fn outcome_for(fate: Fate) -> TallyOutcome {
    let passes = matches!(fate, Fate::Passes | Fate::ExecFails);
    TallyOutcome {
        passes,
        burn_deposits: false,
        result: TallyResult {
            approve: if passes { 9 } else { 1 },
            reject: if passes { 1 } else { 9 },
            abstain: 0,
        },
    }
}

fn populated_engine(fates: &[Fate]) -> GovEngine<MemoryGovStore, FixedTally, GovRouter> {
    let mut store = MemoryGovStore::new(GovParams::default());
    let mut tally = FixedTally::new();

    for (index, fate) in fates.iter().enumerate() {
        let proposal = proposal_for(index, *fate);
        tally.set(proposal.id, outcome_for(*fate));
        store.add_proposal(
            proposal,
            vec![Deposit {
                depositor: "alice".to_string(),
                amount: 1_000,
            }],
        );
    }

    GovEngine::new(store, tally, GovRouter::new())
}

proptest! {
    /// Property test: Determinism
    /// Two engines built from the same snapshot, processing the same block
    /// time, produce identical stores, app state, and event streams.
    #[test]
    fn prop_end_block_deterministic(fates in prop::collection::vec(fate_strategy(), 0..12)) {
        let mut first = populated_engine(&fates);
        let mut second = populated_engine(&fates);

        let mut app_first = KvState::new();
        let mut app_second = KvState::new();
        let mut events_first = EventManager::new();
        let mut events_second = EventManager::new();

        first
            .end_block(&mut app_first, 200, &mut events_first)
            .expect("first run");
        second
            .end_block(&mut app_second, 200, &mut events_second)
            .expect("second run");

        prop_assert_eq!(app_first, app_second);
        prop_assert_eq!(events_first.events(), events_second.events());
        for index in 0..fates.len() {
            let id = ProposalId(index as u64 + 1);
            prop_assert_eq!(first.store().proposal(id), second.store().proposal(id));
        }
    }

    /// Property test: Atomicity
    /// Injecting a failing action at any position leaves the base state
    /// byte-identical and reports that position.
    #[test]
    fn prop_executor_atomicity(
        valid in prop::collection::vec(valid_action_strategy(), 0..8),
        position in 0usize..9,
    ) {
        let mut actions = valid;
        let position = position.min(actions.len());
        actions.insert(position, GovAction::Unsupported);

        let mut state = KvState::new();
        state.set("balances/community_pool", b"1000".to_vec());
        let before = state.clone();

        let err = execute_batch(&GovRouter::new(), &mut state, &actions)
            .expect_err("batch with unsupported action must fail");

        prop_assert_eq!(err.index, position);
        prop_assert_eq!(state, before);
    }

    /// Property test: all-valid batches commit
    /// Without an injected failure the batch commits and yields one event
    /// per action.
    #[test]
    fn prop_executor_commits_valid_batches(
        actions in prop::collection::vec(valid_action_strategy(), 0..8),
    ) {
        let mut state = KvState::new();
        state.set("balances/community_pool", b"1000".to_vec());

        let events = execute_batch(&GovRouter::new(), &mut state, &actions)
            .expect("valid batch must commit");
        prop_assert_eq!(events.len(), actions.len());
    }

    /// Property test: queue membership matches status
    /// After a block, a proposal is in the active queue iff it is still in
    /// its voting period, and terminal proposals are in no queue.
    #[test]
    fn prop_queue_membership_matches_status(
        fates in prop::collection::vec(fate_strategy(), 0..12),
    ) {
        let mut engine = populated_engine(&fates);
        let mut app = KvState::new();
        let mut events = EventManager::new();

        engine.end_block(&mut app, 200, &mut events).expect("end_block");

        for index in 0..fates.len() {
            let id = ProposalId(index as u64 + 1);
            let proposal = engine.store().proposal(id).expect("record survives");
            let in_active = engine.store().in_active_queue(id);
            let in_inactive = engine.store().in_inactive_queue(id);

            prop_assert!(!in_inactive);
            match proposal.status {
                ProposalStatus::VotingPeriod => prop_assert!(in_active),
                _ => prop_assert!(!in_active),
            }
        }

        // A second block at the converted proposals' new deadline drains
        // the queue completely.
        let new_cutoff = 10 + GovParams::default().voting_period.as_secs();
        engine
            .end_block(&mut app, new_cutoff, &mut events)
            .expect("follow-up block");
        prop_assert!(engine.store().active_due(u64::MAX).expect("listing").is_empty());
    }
}

/// Operation for the overlay model property.
#[derive(Debug, Clone)]
enum OverlayOp {
    Set(u8, u8),
    Delete(u8),
}

fn overlay_op_strategy() -> impl Strategy<Value = OverlayOp> {
    prop_oneof![
        (0u8..8, any::<u8>()).prop_map(|(key, value)| OverlayOp::Set(key, value)),
        (0u8..8).prop_map(OverlayOp::Delete),
    ]
}

proptest! {
    /// Property test: overlay reads match a model map
    /// Read-your-writes through the overlay, and the state after commit,
    /// both agree with a plain map fed the same operations.
    #[test]
    fn prop_overlay_matches_model(
        base in prop::collection::btree_map(0u8..8, any::<u8>(), 0..8),
        ops in prop::collection::vec(overlay_op_strategy(), 0..16),
    ) {
        let mut state = KvState::new();
        let mut model: std::collections::BTreeMap<String, Vec<u8>> = Default::default();
        for (key, value) in &base {
            state.set(format!("k{}", key), vec![*value]);
            model.insert(format!("k{}", key), vec![*value]);
        }

        let mut overlay = state.overlay();
        for op in &ops {
            match op {
                OverlayOp::Set(key, value) => {
                    overlay.set(format!("k{}", key), vec![*value]);
                    model.insert(format!("k{}", key), vec![*value]);
                }
                OverlayOp::Delete(key) => {
                    overlay.delete(format!("k{}", key));
                    model.remove(&format!("k{}", key));
                }
            }
        }

        for key in 0u8..8 {
            let key = format!("k{}", key);
            prop_assert_eq!(overlay.get(&key), model.get(&key).map(Vec::as_slice));
        }

        let writes = overlay.into_writes();
        state.commit(writes);
        for key in 0u8..8 {
            let key = format!("k{}", key);
            prop_assert_eq!(state.get(&key), model.get(&key).map(Vec::as_slice));
        }
    }
}
