//! Structured block events.
//!
//! Events are part of the replicated output of a block: every replica must
//! append the same records in the same order. The stream is append-only;
//! nothing is ever reordered or dropped.

use serde::{Deserialize, Serialize};

/// Proposal dropped before reaching the voting period.
pub const TYPE_INACTIVE_PROPOSAL: &str = "inactive_proposal";
/// Proposal left the voting period (finalized or converted).
pub const TYPE_ACTIVE_PROPOSAL: &str = "active_proposal";
/// Emitted by a parameter-change action.
pub const TYPE_PARAM_CHANGE: &str = "param_change";
/// Emitted by a community-spend action.
pub const TYPE_COMMUNITY_SPEND: &str = "community_spend";
/// Emitted by a text action.
pub const TYPE_TEXT_PROPOSAL: &str = "text_proposal";

pub const ATTR_PROPOSAL_ID: &str = "proposal_id";
pub const ATTR_PROPOSAL_RESULT: &str = "proposal_result";
pub const ATTR_PROPOSAL_LOG: &str = "proposal_log";

/// `proposal_result` attribute values.
pub const RESULT_DROPPED: &str = "dropped";
pub const RESULT_PASSED: &str = "passed";
pub const RESULT_REJECTED: &str = "rejected";
pub const RESULT_FAILED: &str = "failed";
pub const RESULT_EXPEDITED_REJECTED: &str = "expedited_rejected";

/// A structured `(type, attributes)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub ty: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(ty: &str) -> Self {
        Self {
            ty: ty.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.push((key.to_string(), value.into()));
        self
    }
}

/// Append-only event stream for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Merge a batch of events, preserving their order.
    pub fn extend(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the stream, e.g. to flush into the ambient block log.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
