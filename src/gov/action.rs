//! Governance actions and their routing.
//!
//! The action set is closed: [`GovRouter`] routes with an exhaustive
//! match, and action kinds this build does not know decode to
//! [`GovAction::Unsupported`], which fails deterministically instead of
//! silently passing.

use serde::{Deserialize, Serialize};

use super::events::{Event, TYPE_COMMUNITY_SPEND, TYPE_PARAM_CHANGE, TYPE_TEXT_PROPOSAL};
use super::overlay::StateOverlay;
use super::traits::ActionDispatcher;

/// Account key of the community pool.
pub const COMMUNITY_POOL: &str = "community_pool";

/// Parameters a `ParamChange` action may set.
const SETTABLE_PARAMS: [&str; 5] = [
    "quorum",
    "threshold",
    "veto_threshold",
    "min_deposit",
    "voting_period",
];

/// A single state-changing operation carried by a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GovAction {
    /// Update a governance-scoped parameter under `params/<name>`.
    ParamChange { name: String, value: String },
    /// Transfer funds from the community pool to a recipient account.
    CommunitySpend { recipient: String, amount: u128 },
    /// Signaling proposal; emits an event, mutates nothing.
    Text { title: String },
    /// Unknown or future action kind.
    #[serde(other)]
    Unsupported,
}

/// Action-level failures. Business-logic rejections: the finalizer absorbs
/// them into a Failed proposal and moves on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("malformed action batch: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown parameter: {0}")]
    UnknownParam(String),

    #[error("invalid value for {param}: {reason}")]
    InvalidValue { param: String, reason: String },

    #[error("insufficient community pool funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("malformed balance record for {0}")]
    MalformedBalance(String),

    #[error("unsupported action kind")]
    Unsupported,
}

fn param_key(name: &str) -> String {
    format!("params/{}", name)
}

fn balance_key(account: &str) -> String {
    format!("balances/{}", account)
}

/// Decode a balance record: decimal UTF-8, absent key = zero.
fn read_balance(state: &StateOverlay<'_>, account: &str) -> Result<u128, ActionError> {
    match state.get(&balance_key(account)) {
        None => Ok(0),
        Some(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ActionError::MalformedBalance(account.to_string())),
    }
}

fn write_balance(state: &mut StateOverlay<'_>, account: &str, amount: u128) {
    state.set(balance_key(account), amount.to_string().into_bytes());
}

/// Routes actions to their handlers.
///
/// Key spaces written: `params/<name>` for parameter updates and
/// `balances/<account>` for transfers, with the community pool held at
/// `balances/community_pool`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovRouter;

impl GovRouter {
    pub fn new() -> Self {
        Self
    }

    fn param_change(
        &self,
        state: &mut StateOverlay<'_>,
        name: &str,
        value: &str,
    ) -> Result<Vec<Event>, ActionError> {
        if !SETTABLE_PARAMS.contains(&name) {
            return Err(ActionError::UnknownParam(name.to_string()));
        }
        if value.is_empty() {
            return Err(ActionError::InvalidValue {
                param: name.to_string(),
                reason: "empty value".to_string(),
            });
        }

        state.set(param_key(name), value.as_bytes().to_vec());

        Ok(vec![Event::new(TYPE_PARAM_CHANGE)
            .attr("name", name)
            .attr("value", value)])
    }

    fn community_spend(
        &self,
        state: &mut StateOverlay<'_>,
        recipient: &str,
        amount: u128,
    ) -> Result<Vec<Event>, ActionError> {
        let pool = read_balance(state, COMMUNITY_POOL)?;
        if pool < amount {
            return Err(ActionError::InsufficientFunds {
                needed: amount,
                available: pool,
            });
        }

        let credited = read_balance(state, recipient)?;
        write_balance(state, COMMUNITY_POOL, pool - amount);
        write_balance(state, recipient, credited + amount);

        Ok(vec![Event::new(TYPE_COMMUNITY_SPEND)
            .attr("recipient", recipient)
            .attr("amount", amount.to_string())])
    }

    fn text(&self, title: &str) -> Result<Vec<Event>, ActionError> {
        Ok(vec![Event::new(TYPE_TEXT_PROPOSAL).attr("title", title)])
    }
}

impl ActionDispatcher for GovRouter {
    fn dispatch(
        &self,
        state: &mut StateOverlay<'_>,
        action: &GovAction,
    ) -> Result<Vec<Event>, ActionError> {
        match action {
            GovAction::ParamChange { name, value } => self.param_change(state, name, value),
            GovAction::CommunitySpend { recipient, amount } => {
                self.community_spend(state, recipient, *amount)
            }
            GovAction::Text { title } => self.text(title),
            GovAction::Unsupported => Err(ActionError::Unsupported),
        }
    }
}
