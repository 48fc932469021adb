//! Transactional execution of a proposal's action batch.
//!
//! Applies an ordered batch against an overlay of the base state and
//! commits only if every action succeeds. The overlay is local to one
//! batch attempt and is never reused across proposals.

use super::action::{ActionError, GovAction};
use super::events::Event;
use super::overlay::KvState;
use super::traits::ActionDispatcher;

/// Failure of an action batch: the zero-based position of the first
/// failing action and its error.
#[derive(Debug, thiserror::Error)]
#[error("action {index} failed on execution: {source}")]
pub struct ExecError {
    pub index: usize,
    #[source]
    pub source: ActionError,
}

/// Apply `actions` strictly in order against an overlay of `base`.
///
/// All-or-nothing: on full success the overlay is committed onto `base`
/// and the returned events are the concatenation of every action's events
/// in original order. On the first failure the overlay is discarded and
/// `base` is left byte-identical to before the call.
pub fn execute_batch<D: ActionDispatcher>(
    router: &D,
    base: &mut KvState,
    actions: &[GovAction],
) -> Result<Vec<Event>, ExecError> {
    let mut overlay = base.overlay();
    let mut events = Vec::new();

    for (index, action) in actions.iter().enumerate() {
        match router.dispatch(&mut overlay, action) {
            Ok(mut action_events) => events.append(&mut action_events),
            Err(source) => return Err(ExecError { index, source }),
        }
    }

    let writes = overlay.into_writes();
    base.commit(writes);
    Ok(events)
}
