//! Explicit transition acceptance policy - no IO, fully testable.
//!
//! The tracking client may re-publish the same transition (reconnect
//! replay), so suppression of repeated notifications is opt-in per event
//! kind; some automations legitimately want every raw event.

use crate::config::EngineConfig;
use waypost_model::TransitionKind;

/// Whether a reported transition should fire notifications.
///
/// `enter` with suppression on is accepted only when the user is not already
/// in the reported fence; `leave` with suppression on only when the user is
/// inside some fence. With suppression off, every report is accepted.
pub fn evaluate(
    config: &EngineConfig,
    current_fence: &str,
    kind: TransitionKind,
    desc: &str,
) -> bool {
    match kind {
        TransitionKind::Enter => !config.double_enter || current_fence != desc,
        TransitionKind::Leave => !config.double_leave || !current_fence.is_empty(),
    }
}
