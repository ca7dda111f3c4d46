//! Zeno Flick - a precision-throw arcade game core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (throw state machine, physics, stamina, cinematics, scoring)
//! - `audio`: Sound cue vocabulary handed to the audio collaborator
//! - `settings`: Immutable per-session configuration
//! - `throws`: Throw economy (free, permanent, practice mode)
//! - `leaderboard`: Personal top landing distances

pub mod audio;
pub mod leaderboard;
pub mod settings;
pub mod sim;
pub mod throws;

pub use leaderboard::Leaderboard;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// The cliff edge. Landing at or beyond it is a fall.
    pub const CLIFF_EDGE: f64 = 420.0;
    /// World height (y grows downward)
    pub const WORLD_HEIGHT: f64 = 240.0;
    /// Ground line the thrower lands and slides on
    pub const GROUND_Y: f64 = WORLD_HEIGHT - 20.0;
    /// Sticky ceiling
    pub const CEILING_Y: f64 = 20.0;
    /// Where every throw starts
    pub const LAUNCH_PAD_X: f64 = 20.0;

    /// Gravity per frame at time scale 1.0
    pub const BASE_GRAVITY: f64 = 0.15;
    /// Global gameplay speed (0.55 = 55% speed)
    pub const TIME_SCALE: f64 = 0.55;
    /// Nominal frame delta in seconds (input frames, independent of slow-mo)
    pub const FRAME_DT: f64 = 1.0 / 60.0;

    /// Half period of the charge triangle wave
    pub const CHARGE_MS: f64 = 1800.0;
    pub const MIN_POWER: f64 = 4.0;
    pub const MAX_POWER: f64 = 10.0;
    /// Charge power band that counts as the sweet spot
    pub const SWEET_SPOT_MIN: f64 = 0.70;
    pub const SWEET_SPOT_MAX: f64 = 0.85;

    /// Launch angle limits (degrees)
    pub const MIN_ANGLE: f64 = 20.0;
    pub const MAX_ANGLE: f64 = 70.0;
    pub const OPTIMAL_ANGLE: f64 = 45.0;

    /// Ground contact keeps this share of horizontal speed
    pub const IMPACT_RESTITUTION: f64 = 0.55;
    /// Slide friction base, raised to (time scale * friction multiplier)
    pub const SLIDE_FRICTION: f64 = 0.92;
    /// Slide stops once |vx| drops below this
    pub const SLIDE_REST_SPEED: f64 = 0.1;

    /// Stamina pool size, refilled at the start of every throw
    pub const MAX_STAMINA: f64 = 100.0;
    /// Stamina at or below this plays the low-stamina warning
    pub const STAMINA_LOW: f64 = 25.0;
    /// Frames of shake after a denied action
    pub const DENIED_SHAKE_FRAMES: u32 = 8;

    /// Ring multipliers cap
    pub const MAX_FINAL_MULTIPLIER: f64 = 5.0;
    /// Perfect landing window around the Zeno target
    pub const PERFECT_WINDOW: f64 = 0.5;
    pub const PERFECT_BONUS: f64 = 10.0;
    /// Decimal digits kept for landing distances
    pub const DISTANCE_DECIMALS: i32 = 8;

    /// Reset delays after an outcome
    pub const LANDING_RESET_MS: u32 = 800;
    pub const FALL_RESET_MS: u32 = 2000;

    /// Trail points older than this many frames are pruned
    pub const TRAIL_MAX_AGE: u32 = 40;
    /// Ghost trail sampling interval and length
    pub const GHOST_INTERVAL_MS: f64 = 50.0;
    pub const GHOST_TRAIL_LENGTH: usize = 20;
    /// Best trail keeps at most this many run trail points
    pub const BEST_TRAIL_LENGTH: usize = 240;
}

/// Round a distance to the landing precision (8 decimals).
///
/// Non-finite input maps to 0.0 so it can never become a record.
#[inline]
pub fn round_distance(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(consts::DISTANCE_DECIMALS);
    (x * scale).round() / scale
}

/// Position of `x` within `[start, end]` as 0..1, clamped.
///
/// A zero-width range yields 0.0.
#[inline]
pub fn inverse_lerp(start: f64, end: f64, x: f64) -> f64 {
    let width = end - start;
    if width.abs() < f64::EPSILON || !x.is_finite() {
        return 0.0;
    }
    ((x - start) / width).clamp(0.0, 1.0)
}
