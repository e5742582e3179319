//! Device-addressed command payloads.
//!
//! The only command currently defined is `setWaypoints`, which serializes
//! the full fence registry so a freshly connected device can sync every
//! region in one message. Delivery over the transport is out of scope; the
//! builder returns the payload string.

use serde::Serialize;

use crate::registry::FenceRegistry;

/// The fence-sync command name.
pub const SET_WAYPOINTS: &str = "setWaypoints";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("command serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct WaypointBody<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    desc: &'a str,
    lat: f64,
    lon: f64,
    rad: f64,
    tst: i64,
}

#[derive(Serialize)]
struct WaypointSet<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    waypoints: Vec<WaypointBody<'a>>,
}

#[derive(Serialize)]
struct SyncCommand<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    action: &'a str,
    waypoints: WaypointSet<'a>,
}

/// Build the payload for a named command.
///
/// Unknown command names are a no-op (`Ok(None)`), not an error. Output is
/// deterministic given registry contents: waypoints are ordered by fence
/// name, and an empty registry yields a well-formed empty sync.
pub fn build(action: &str, registry: &FenceRegistry) -> Result<Option<String>, BuildError> {
    match action {
        SET_WAYPOINTS => {
            let fences = registry.snapshot();
            let command = SyncCommand {
                kind: "cmd",
                action: SET_WAYPOINTS,
                waypoints: WaypointSet {
                    kind: "waypoints",
                    waypoints: fences
                        .iter()
                        .map(|f| WaypointBody {
                            kind: "waypoint",
                            desc: &f.name,
                            lat: f.lat,
                            lon: f.lon,
                            rad: f.radius,
                            tst: f.timestamp,
                        })
                        .collect(),
                },
            };
            Ok(Some(serde_json::to_string(&command)?))
        }
        _ => Ok(None),
    }
}
