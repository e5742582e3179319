//! Named circular region a device can be inside or outside of.

use serde::{Deserialize, Serialize};

use crate::message::WaypointPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    /// Unique key; upserts replace by name.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Radius in meters.
    pub radius: f64,
    /// Unix timestamp (seconds) of the defining message.
    pub timestamp: i64,
}

impl From<WaypointPayload> for Fence {
    fn from(wp: WaypointPayload) -> Self {
        Self {
            name: wp.desc,
            lat: wp.lat,
            lon: wp.lon,
            radius: wp.rad,
            timestamp: wp.tst,
        }
    }
}
