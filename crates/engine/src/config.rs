//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default accuracy gate in meters.
pub const DEFAULT_ACCURACY_M: u32 = 300;

/// Tunables for transition acceptance and reconciliation.
///
/// All values come from external configuration; the engine treats them as
/// read-mostly and a host may swap them at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum reported accuracy radius (meters) for a fix to be trusted.
    pub accuracy: u32,
    /// Suppress a repeated enter for the fence the user is already in.
    pub double_enter: bool,
    /// Suppress a leave while the user is not inside any fence.
    pub double_leave: bool,
    /// Reconcile fence state against region-membership snapshots.
    pub use_inregions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY_M,
            double_enter: true,
            double_leave: true,
            use_inregions: true,
        }
    }
}

impl EngineConfig {
    /// Whether a reported accuracy is trustworthy enough to drive
    /// transitions. A missing accuracy never is.
    pub fn is_accurate(&self, acc: Option<f64>) -> bool {
        acc.map(|a| a <= f64::from(self.accuracy)).unwrap_or(false)
    }
}
