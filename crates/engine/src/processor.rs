//! The engine: classification entry point and the two transition paths.

use std::sync::RwLock;

use tracing::{debug, error, info};
use waypost_events::{Event, EventDispatcherRef};
use waypost_model::{
    Fence, LocationPayload, Message, MessageError, Topic, TopicError, TransitionKind,
    TransitionPayload, User,
};

use crate::command::{self, BuildError};
use crate::config::EngineConfig;
use crate::reconcile::{self, Correction};
use crate::registry::FenceRegistry;
use crate::store::UserStore;
use crate::transition;

/// Why an inbound publish was dropped. Never fatal: the engine stays
/// available for the next message regardless of any single outcome.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Per-user geofence state machine over a stream of decoded publishes.
///
/// Callers must serialize messages per user (see the ingest crate's router);
/// the explicit and implicit paths read-then-write the user's fence
/// non-atomically. Messages for different users may run in parallel.
pub struct Engine {
    config: RwLock<EngineConfig>,
    users: UserStore,
    fences: FenceRegistry,
    dispatcher: EventDispatcherRef,
}

impl Engine {
    pub fn new(config: EngineConfig, dispatcher: EventDispatcherRef) -> Self {
        Self {
            config: RwLock::new(config),
            users: UserStore::new(),
            fences: FenceRegistry::new(),
            dispatcher,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().expect("config lock poisoned").clone()
    }

    /// Apply a settings change at runtime.
    pub fn update_config(&self, config: EngineConfig) {
        *self.config.write().expect("config lock poisoned") = config;
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn fences(&self) -> &FenceRegistry {
        &self.fences
    }

    /// Build a device-addressed command payload from current registry state.
    pub fn build_command(&self, action: &str) -> Result<Option<String>, BuildError> {
        command::build(action, &self.fences)
    }

    /// Process one publish to completion.
    ///
    /// Malformed topics and payloads are logged and returned as errors so
    /// the caller can count drops; nothing was mutated and no event fired.
    /// Payloads without a message type, and types the engine has no behavior
    /// for, are ignored silently.
    pub async fn handle_message(&self, topic: &str, payload: &str) -> Result<(), EngineError> {
        debug!(topic, payload, "received publish");

        let parsed = match Topic::parse(topic) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("dropping publish: {e}");
                return Err(e.into());
            }
        };
        let message = match Message::classify(payload) {
            Ok(message) => message,
            Err(e) => {
                error!(topic, "dropping malformed payload: {e}");
                return Err(e.into());
            }
        };
        let Some(message) = message else {
            debug!(topic, "payload carries no message type, ignoring");
            return Ok(());
        };

        let mut user = self.users.resolve(&parsed.user_id, &parsed.device_id);

        match message {
            Message::Transition(t) => self.process_transition(topic, &mut user, t).await,
            Message::Location(l) => self.process_location(topic, &mut user, l).await,
            Message::Waypoint(w) => {
                debug!(fence = %w.desc, "waypoint definition");
                self.fences.upsert(Fence::from(w));
            }
            Message::Waypoints(w) => {
                debug!(count = w.waypoints.len(), "bulk waypoint sync");
                for waypoint in w.waypoints {
                    self.fences.upsert(Fence::from(waypoint));
                }
            }
            Message::Beacon(b) => {
                debug!(uuid = ?b.uuid, major = ?b.major, minor = ?b.minor, "beacon report");
            }
            // Decryption is out of scope; inbound commands are not ours.
            Message::Encrypted(_) | Message::Cmd(_) | Message::Unknown => {
                debug!(topic, "no behavior for message type, ignoring");
            }
        }

        self.users.save(user);
        Ok(())
    }

    /// Explicit path: a client-reported enter/leave.
    async fn process_transition(&self, topic: &str, user: &mut User, msg: TransitionPayload) {
        // Region metadata stays fresh even when the transition itself is
        // gated or suppressed below.
        self.fences.upsert(Fence {
            name: msg.desc.clone(),
            lat: msg.lat,
            lon: msg.lon,
            radius: msg.rad.unwrap_or(0.0),
            timestamp: msg.tst,
        });

        let config = self.config();
        if !config.is_accurate(msg.acc) {
            debug!(
                acc = ?msg.acc,
                limit = config.accuracy,
                "fix too coarse, ignoring transition"
            );
            return;
        }

        user.lat = msg.lat;
        user.lon = msg.lon;
        user.timestamp = msg.tst;

        if !transition::evaluate(&config, &user.fence, msg.event, &msg.desc) {
            debug!(
                user = %user.user_id,
                fence = %msg.desc,
                event = %msg.event,
                "duplicate transition suppressed"
            );
            return;
        }

        match msg.event {
            TransitionKind::Enter => {
                user.fence = msg.desc.clone();
                self.fire(Event::enter(&user.user_id, &msg.desc, user.battery, topic))
                    .await;
            }
            TransitionKind::Leave => {
                user.fence.clear();
                self.fire(Event::leave(&user.user_id, &msg.desc, user.battery, topic))
                    .await;
            }
        }
        info!(
            user = %user.user_id,
            fence = %msg.desc,
            event = %msg.event,
            "transition accepted"
        );
        self.fire(Event::generic(
            msg.event,
            &user.user_id,
            &msg.desc,
            user.battery,
            topic,
        ))
        .await;
    }

    /// Implicit path: position report, battery, and snapshot reconciliation.
    async fn process_location(&self, topic: &str, user: &mut User, msg: LocationPayload) {
        user.lat = msg.lat;
        user.lon = msg.lon;
        user.timestamp = msg.tst;
        user.tracker_id = msg.tid;

        // Battery reporting is independent of position trust.
        if let Some(batt) = msg.batt {
            user.battery = Some(batt);
            debug!(user = %user.user_id, battery = batt, "battery level");
            self.fire(Event::battery(&user.user_id, &user.fence, batt, topic))
                .await;
        }

        let config = self.config();
        if !config.use_inregions {
            return;
        }
        if msg.inregions.is_some() {
            // Sticky: a later report without a snapshot now means "inside
            // no region" rather than "snapshot not supported".
            user.inregions_supported = true;
        }

        let corrections = reconcile::plan(
            &user.fence,
            msg.inregions.as_deref(),
            user.inregions_supported,
            config.is_accurate(msg.acc),
        );
        for correction in corrections {
            match correction {
                Correction::Leave => {
                    info!(
                        user = %user.user_id,
                        fence = %user.fence,
                        "synthesizing missed leave"
                    );
                    user.fence.clear();
                    self.fire(Event::leave(&user.user_id, "", user.battery, topic))
                        .await;
                    self.fire(Event::generic(
                        TransitionKind::Leave,
                        &user.user_id,
                        "",
                        user.battery,
                        topic,
                    ))
                    .await;
                }
                Correction::Enter(fence) => {
                    info!(user = %user.user_id, fence = %fence, "synthesizing missed enter");
                    user.fence = fence.clone();
                    self.fire(Event::enter(&user.user_id, &fence, user.battery, topic))
                        .await;
                    self.fire(Event::generic(
                        TransitionKind::Enter,
                        &user.user_id,
                        &fence,
                        user.battery,
                        topic,
                    ))
                    .await;
                }
            }
        }
    }

    /// Fire-and-forget: a dispatch failure is logged and never rolls back
    /// the state mutation already applied.
    async fn fire(&self, event: Event) {
        let kind = event.kind;
        if let Err(e) = self.dispatcher.dispatch(event).await {
            error!(%kind, "event dispatch failed: {e}");
        }
    }
}
