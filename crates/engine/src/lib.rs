//! Geofence transition and reconciliation engine.
//!
//! The engine consumes already-decoded publishes from a location-tracking
//! client and turns them into deduplicated `enter`/`leave`/`battery` events:
//!
//! - the **transition processor** handles explicit client-reported
//!   transitions, applying accuracy gating and double-notify suppression;
//! - the **region reconciler** compares a location report's region snapshot
//!   against stored state and synthesizes the transitions the client never
//!   managed to send.
//!
//! Decision logic lives in pure modules ([`transition`], [`reconcile`]);
//! [`Engine`] owns the state and wires them to the event dispatcher.

pub mod command;
mod config;
mod processor;
pub mod reconcile;
mod registry;
mod store;
pub mod transition;

pub use command::BuildError;
pub use config::{EngineConfig, DEFAULT_ACCURACY_M};
pub use processor::{Engine, EngineError};
pub use registry::FenceRegistry;
pub use store::UserStore;
