//! Gavel - Deterministic Proposal Finalization
//!
//! A per-block governance engine for replicated state machines.
//!
//! Key principles:
//! - Determinism is the contract: same store snapshot + same block time
//!   on every replica produces byte-identical state and events
//! - Single-threaded, run-to-completion per block (no I/O, no wall clock)
//! - Approved action batches apply all-or-nothing through a discardable
//!   state overlay
//! - Storage faults halt the step; action faults only fail the proposal

pub mod gov;
