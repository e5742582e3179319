//! Dispatcher abstraction for decoupled event delivery.
//!
//! The engine fires events through the `EventDispatcher` trait so the core
//! logic can be tested without a live automation backend and so hosts can
//! plug in whatever trigger mechanism they use. Dispatch is fire-and-forget:
//! the engine logs a failure and moves on.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{Event, EventKind};

/// Failure to deliver an event to the automation backend.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch rejected: {0}")]
    Rejected(String),
    #[error("dispatcher closed")]
    Closed,
}

/// Trait for delivering events to downstream automation.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: Event) -> Result<(), DispatchError>;
}

/// Type alias for shared dispatcher reference.
pub type EventDispatcherRef = Arc<dyn EventDispatcher>;

/// In-memory dispatcher for testing.
///
/// Captures all dispatched events for later inspection.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<Event>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in dispatch order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Captured events of a specific kind.
    pub fn events_of(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl EventDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Dispatcher that discards all events.
pub struct NullDispatcher;

#[async_trait]
impl EventDispatcher for NullDispatcher {
    async fn dispatch(&self, _event: Event) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Dispatcher that rejects every event. Used to verify that the engine
/// logs dispatch failures and keeps going.
pub struct FailingDispatcher;

#[async_trait]
impl EventDispatcher for FailingDispatcher {
    async fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        Err(DispatchError::Rejected(format!(
            "{} for {}",
            event.kind, event.tokens.user
        )))
    }
}
