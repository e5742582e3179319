//! Outbound event contracts for downstream automation.
//!
//! This crate defines the formal shape of every event the engine emits —
//! `enter`, `leave`, `battery`, and the catch-all `generic` — and the
//! `EventDispatcher` trait the engine fires them through. Events are
//! fire-and-forget facts: the engine never stores them and a failed dispatch
//! never rolls back state.

mod dispatch;

pub use dispatch::{
    DispatchError, EventDispatcher, EventDispatcherRef, FailingDispatcher, NullDispatcher,
    RecordingDispatcher,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use waypost_model::TransitionKind;

/// Kind of an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The user entered a fence.
    Enter,
    /// The user left a fence.
    Leave,
    /// The device reported a battery level.
    Battery,
    /// Catch-all notification, fired once per accepted transition.
    Generic,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Enter => "enter",
            EventKind::Leave => "leave",
            EventKind::Battery => "battery",
            EventKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// User-facing substitution values carried by an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTokens {
    pub user: String,
    /// Fence name the event refers to; empty for a synthetic leave.
    pub fence: String,
    /// Last known battery percentage, when one was ever reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<u8>,
    /// Transition direction; set only on `generic` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<TransitionKind>,
}

/// Correlation data for the triggering call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerState {
    /// Routing key the causing message arrived on.
    pub topic: String,
    /// Fence the event correlates with.
    pub fence: String,
}

/// One emitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub kind: EventKind,
    /// Milliseconds since epoch at emission time.
    pub timestamp: i64,
    pub tokens: EventTokens,
    pub state: TriggerState,
}

impl Event {
    fn new(kind: EventKind, tokens: EventTokens, state: TriggerState) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: chrono::Utc::now().timestamp_millis(),
            tokens,
            state,
        }
    }

    /// The user entered `fence`.
    pub fn enter(user: &str, fence: &str, battery: Option<u8>, topic: &str) -> Self {
        Self::new(
            EventKind::Enter,
            EventTokens {
                user: user.to_string(),
                fence: fence.to_string(),
                battery,
                event: None,
            },
            TriggerState {
                topic: topic.to_string(),
                fence: fence.to_string(),
            },
        )
    }

    /// The user left `fence`. A synthetic leave passes the empty string.
    pub fn leave(user: &str, fence: &str, battery: Option<u8>, topic: &str) -> Self {
        Self::new(
            EventKind::Leave,
            EventTokens {
                user: user.to_string(),
                fence: fence.to_string(),
                battery,
                event: None,
            },
            TriggerState {
                topic: topic.to_string(),
                fence: fence.to_string(),
            },
        )
    }

    /// The device reported `battery` percent while inside `fence` (or none).
    pub fn battery(user: &str, fence: &str, battery: u8, topic: &str) -> Self {
        Self::new(
            EventKind::Battery,
            EventTokens {
                user: user.to_string(),
                fence: fence.to_string(),
                battery: Some(battery),
                event: None,
            },
            TriggerState {
                topic: topic.to_string(),
                fence: fence.to_string(),
            },
        )
    }

    /// Catch-all notification for an accepted transition.
    pub fn generic(
        transition: TransitionKind,
        user: &str,
        fence: &str,
        battery: Option<u8>,
        topic: &str,
    ) -> Self {
        Self::new(
            EventKind::Generic,
            EventTokens {
                user: user.to_string(),
                fence: fence.to_string(),
                battery,
                event: Some(transition),
            },
            TriggerState {
                topic: topic.to_string(),
                fence: fence.to_string(),
            },
        )
    }
}
