//! Mutable analysis configuration with explicit snapshot/restore.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration consulted by tools and pipeline code.
///
/// Variant chains snapshot this value on entry and restore it on exit, so a
/// branch exploring an alternative configuration cannot leak mutations into
/// sibling branches. Running counters and registered pools deliberately live
/// outside of `Settings` and survive variant boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Scale simulation to this luminosity instead of the summed data's.
    pub target_lumi: Option<f64>,
    /// Color per legend entry.
    pub colors: BTreeMap<String, String>,
    /// Legend entries in stacking order, bottom first.
    pub stacking_order: Vec<String>,
    /// Name of the systematic variant currently being processed.
    pub active_variant: Option<String>,
    /// Open extension map for caller-defined knobs.
    pub extra: BTreeMap<String, String>,
}

impl Settings {
    /// Capture the current configuration.
    pub fn snapshot(&self) -> Settings {
        self.clone()
    }

    /// Reinstate a captured configuration exactly.
    pub fn restore(&mut self, snapshot: Settings) {
        *self = snapshot;
    }
}
