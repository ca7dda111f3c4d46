//! Stamina economy
//!
//! One pool per throw, spent by precision actions. Costs grow quadratically
//! over the last 70 units before the cliff edge.

use serde::{Deserialize, Serialize};

use super::state::SessionState;
use crate::consts::*;

/// Width of the costly band before the edge
pub const EDGE_ZONE_WIDTH: f64 = 70.0;
/// Positions at or below this pay base cost
pub const SAFE_ZONE_END: f64 = CLIFF_EDGE - EDGE_ZONE_WIDTH;
/// Stamina-low warning cadence
const LOW_WARNING_INTERVAL_MS: f64 = 500.0;

/// Result of a stamina-gated action attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub applied: bool,
    pub denied: bool,
}

impl ActionResult {
    /// Nothing attempted this frame
    pub const NONE: Self = Self {
        applied: false,
        denied: false,
    };
    pub const APPLIED: Self = Self {
        applied: true,
        denied: false,
    };
    pub const DENIED: Self = Self {
        applied: false,
        denied: true,
    };
}

/// Cost scaling by position: 1.0 in the safe zone, 2.0 at the edge.
///
/// Positions past the edge pay the edge price.
pub fn edge_multiplier(px: f64) -> f64 {
    if !px.is_finite() || px <= SAFE_ZONE_END {
        return 1.0;
    }
    let t = (px.min(CLIFF_EDGE) - SAFE_ZONE_END) / EDGE_ZONE_WIDTH;
    1.0 + t * t
}

/// Cost of a one-shot action, rounded up to whole stamina
pub fn discrete_cost(base: f64, px: f64) -> f64 {
    (base * edge_multiplier(px)).ceil()
}

/// Cost of holding an action for `dt` seconds (fractional)
pub fn continuous_cost(base_per_second: f64, px: f64, dt: f64) -> f64 {
    base_per_second * edge_multiplier(px) * dt
}

impl SessionState {
    /// Deduct `cost` if affordable.
    ///
    /// On denial nothing is deducted and the denial shake timer is armed.
    pub fn try_spend(&mut self, cost: f64) -> bool {
        if !cost.is_finite() || cost < 0.0 || self.stamina < cost {
            self.stamina_denied_shake = DENIED_SHAKE_FRAMES;
            return false;
        }
        self.stamina = (self.stamina - cost).max(0.0);
        self.stamina_used_this_throw += cost;
        true
    }

    /// Count down denial feedback frames
    pub fn tick_denied_shake(&mut self) {
        self.stamina_denied_shake = self.stamina_denied_shake.saturating_sub(1);
    }

    pub fn stamina_is_low(&self) -> bool {
        self.stamina > 0.0 && self.stamina <= STAMINA_LOW
    }
}

/// True when a low-stamina warning is due this frame
pub fn low_warning_due(state: &SessionState, now_ms: f64) -> bool {
    state.stamina_is_low()
        && (now_ms / LOW_WARNING_INTERVAL_MS).floor()
            != ((now_ms - 16.0) / LOW_WARNING_INTERVAL_MS).floor()
}
