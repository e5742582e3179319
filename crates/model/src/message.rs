//! Inbound wire messages published by the tracking client.
//!
//! One internally tagged union over the `_type` discriminator, with an
//! explicit schema per variant. Required fields are enforced here, at the
//! classification boundary, so the engine never sees half-decoded input.
//! Fields the engine does not consume are left out; serde skips them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification failure for an inbound payload.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Direction of an explicit fence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Leave,
}

impl TransitionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransitionKind::Enter => "enter",
            TransitionKind::Leave => "leave",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Periodic position report, optionally carrying battery level and a
/// region-membership snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPayload {
    pub lat: f64,
    pub lon: f64,
    /// Unix timestamp (seconds) of the fix.
    pub tst: i64,
    /// Reported accuracy radius in meters. Absent means untrusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
    /// Battery percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batt: Option<u8>,
    /// Opaque client-supplied tracker tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    /// Names of the regions the client believes it currently occupies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inregions: Option<Vec<String>>,
}

/// Explicit client-reported enter/leave for a named fence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionPayload {
    pub event: TransitionKind,
    /// Fence name.
    pub desc: String,
    pub lat: f64,
    pub lon: f64,
    pub tst: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
    /// Fence radius in meters; some clients omit it on transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rad: Option<f64>,
}

/// A fence definition as published by the tracking client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointPayload {
    pub desc: String,
    pub lat: f64,
    pub lon: f64,
    pub rad: f64,
    pub tst: i64,
}

/// Bulk fence sync: the client publishing all of its regions at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointsPayload {
    pub waypoints: Vec<WaypointPayload>,
}

/// Detected iBeacon report. Logged, never acted on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tst: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prox: Option<i64>,
}

/// Encrypted envelope around another message. Decryption is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub data: String,
}

/// Command addressed at a device. The engine emits these; inbound ones are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdPayload {
    pub action: String,
}

/// Every message kind the transport can deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "lowercase")]
pub enum Message {
    Location(LocationPayload),
    Transition(TransitionPayload),
    Waypoint(WaypointPayload),
    Waypoints(WaypointsPayload),
    Beacon(BeaconPayload),
    Encrypted(EncryptedPayload),
    Cmd(CmdPayload),
    #[serde(other)]
    Unknown,
}

impl Message {
    /// Classify a raw payload string.
    ///
    /// Returns `Ok(None)` for a well-formed JSON object without a `_type`
    /// discriminator; such payloads are ignorable by design, not errors.
    /// Anything that is not a JSON object, or that names a known `_type`
    /// but fails its schema, is rejected.
    pub fn classify(payload: &str) -> Result<Option<Message>, MessageError> {
        let value: Value = serde_json::from_str(payload)?;
        let Some(object) = value.as_object() else {
            return Err(MessageError::NotAnObject);
        };
        if !object.contains_key("_type") {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}
