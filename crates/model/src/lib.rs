//! Shared domain types for the waypost engine.
//!
//! This crate defines the wire schema published by the tracking client,
//! routing-key parsing, and the mutable records the engine keeps per tracked
//! user and per named fence. Persistence is declared here as repository
//! traits and implemented by the storage layer, keeping the domain decoupled.

mod fence;
mod message;
mod repo;
mod topic;
mod user;

pub use fence::Fence;
pub use message::{
    BeaconPayload, CmdPayload, EncryptedPayload, LocationPayload, Message, MessageError,
    TransitionKind, TransitionPayload, WaypointPayload, WaypointsPayload,
};
pub use repo::{FenceRepository, UserRepository};
pub use topic::{Topic, TopicError};
pub use user::User;
