//! Mutable record per tracked identity.

use serde::{Deserialize, Serialize};

/// State for one tracked user/device pair.
///
/// `fence` holds the name of the fence the user is currently inside, or the
/// empty string when outside every known fence. Absence is represented, not
/// `None`, so fence comparisons stay total. Only the transition processor and
/// the region reconciler write it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    /// Updated in place when the same user publishes from a new device.
    pub device_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Unix timestamp (seconds) of the last trusted position.
    pub timestamp: i64,
    pub fence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<String>,
    /// Sticky: once a client is seen sending a region snapshot it is assumed
    /// to always send one, so a later absence means "inside no region".
    /// Never reset.
    #[serde(default)]
    pub inregions_supported: bool,
}

impl User {
    pub fn new(user_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            lat: 0.0,
            lon: 0.0,
            timestamp: 0,
            fence: String::new(),
            battery: None,
            tracker_id: None,
            inregions_supported: false,
        }
    }

    /// Whether the user is currently inside a known fence.
    pub fn in_fence(&self) -> bool {
        !self.fence.is_empty()
    }
}
