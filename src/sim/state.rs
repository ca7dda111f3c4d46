//! Session state and core simulation types
//!
//! One `SessionState` lives for the whole game session. It is mutated in
//! place by `tick`, and per-throw fields are cleared by `reset_throw`.

use std::collections::BTreeSet;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cinematic::Cinematic;
use super::input::{InputBuffer, PrecisionInput};
use super::landing::{FailureAnimation, NearMiss};
use super::precision::PendingTap;
use super::rings::{Ring, generate_rings};
use super::tutorial::TutorialState;
use crate::consts::*;
use crate::leaderboard::Leaderboard;

/// How a resolved throw ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Tumble,
    Dive,
}

/// Final result of a throw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThrowOutcome {
    /// Came to rest before the edge
    Landed {
        distance: f64,
        perfect: bool,
        multiplier: f64,
    },
    /// Went over the edge
    FellOff { failure: FailureKind },
}

/// Throw lifecycle. Exactly one variant is active, so the
/// charging/flying/sliding flags can never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThrowPhase {
    /// Waiting on the pad for a press
    Idle,
    /// Control held, power oscillating
    Charging { started_ms: f64, power: f64 },
    /// Ballistic flight
    Flying { launched_ms: f64 },
    /// On the ground, decelerating
    Sliding { launched_ms: f64 },
    /// Outcome latched until `reset_throw`
    Resolved(ThrowOutcome),
}

impl ThrowPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, ThrowPhase::Idle)
    }

    pub fn is_charging(&self) -> bool {
        matches!(self, ThrowPhase::Charging { .. })
    }

    pub fn is_flying(&self) -> bool {
        matches!(self, ThrowPhase::Flying { .. })
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self, ThrowPhase::Sliding { .. })
    }

    /// Flying or sliding
    pub fn in_motion(&self) -> bool {
        self.is_flying() || self.is_sliding()
    }

    /// The landed latch: input is ignored until the throw is reset
    pub fn is_resolved(&self) -> bool {
        matches!(self, ThrowPhase::Resolved(_))
    }

    /// Launch timestamp while the throw is in motion
    pub fn launched_ms(&self) -> Option<f64> {
        match *self {
            ThrowPhase::Flying { launched_ms } | ThrowPhase::Sliding { launched_ms } => {
                Some(launched_ms)
            }
            _ => None,
        }
    }
}

/// Trail point for rendering (aged every frame)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: DVec2,
    pub age: u32,
    /// Already beyond the Zeno target when recorded
    pub past_target: bool,
}

/// Low-frequency echo sample of the flight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GhostFrame {
    pub pos: DVec2,
    pub vel: DVec2,
    pub angle: f64,
    pub timestamp_ms: f64,
}

/// In-flight control bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirControl {
    pub float_taps: u32,
    pub thrust_taps: u32,
    /// Frames spent braking this throw
    pub brake_frames: u32,
    pub is_holding_brake: bool,
    /// Milliseconds of braking time accumulated this throw
    pub throttle_ms_used: f64,
    /// Timestamps (ms) of recent float taps
    pub recent_tap_times: Vec<f64>,
}

/// Sliding control bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideControl {
    pub extend_taps: u32,
    pub brake_frames: u32,
}

/// Aggregate lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_throws: u32,
    pub successful_landings: u32,
    pub total_distance: f64,
    pub perfect_landings: u32,
    pub max_multiplier: f64,
    pub total_rings_passed: u32,
    pub max_rings_in_throw: u32,
    pub perfect_ring_throws: u32,
    /// Seconds
    pub max_air_time: f64,
}

/// Daily best values, owned by the host and merged on landing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub best_distance: f64,
    pub best_score: f64,
}

/// Persisted progression, read once at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub best: f64,
    pub zeno_target: f64,
    pub zeno_level: u32,
    pub total_score: f64,
    pub total_falls: u32,
    pub stats: Stats,
    pub achievements: BTreeSet<String>,
    /// Ghost path of the best throw
    pub best_trail: Vec<DVec2>,
    pub best_hot_streak: u32,
    #[serde(default)]
    pub leaderboard: Leaderboard,
    #[serde(default)]
    pub tutorial_seen: TutorialSeen,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            best: 0.0,
            zeno_target: CLIFF_EDGE / 2.0,
            zeno_level: 0,
            total_score: 0.0,
            total_falls: 0,
            stats: Stats::default(),
            achievements: BTreeSet::new(),
            best_trail: Vec::new(),
            best_hot_streak: 0,
            leaderboard: Leaderboard::new(),
            tutorial_seen: TutorialSeen::default(),
        }
    }
}

impl Progress {
    /// Repair a loaded record so the target sits strictly between best and the edge
    pub fn normalized(mut self) -> Self {
        if !self.best.is_finite() || self.best < 0.0 || self.best >= CLIFF_EDGE {
            log::warn!("Discarding invalid best {}", self.best);
            self.best = 0.0;
        }
        let target_ok = self.zeno_target.is_finite()
            && self.zeno_target > self.best
            && self.zeno_target < CLIFF_EDGE;
        if !target_ok {
            self.zeno_target = (self.best + CLIFF_EDGE) / 2.0;
        }
        self
    }
}

/// Which tutorials have already been shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialSeen {
    pub charge: bool,
    pub air: bool,
    pub slide: bool,
}

/// Complete session state (single writer: `tick`)
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Run seed for ring layouts and wind
    pub seed: u64,
    pub phase: ThrowPhase,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Launch angle in degrees
    pub angle_deg: f64,
    /// Launch speed of the current throw (thrust cap reference)
    pub initial_speed: f64,
    pub wind: f64,
    pub try_count: u32,
    /// Whole-frame cancellation
    pub paused: bool,
    /// No real throw was available; scoring and persistence are suppressed
    pub practice_mode: bool,

    // === Stamina ===
    pub stamina: f64,
    pub stamina_used_this_throw: f64,
    /// Frames of denial feedback remaining
    pub stamina_denied_shake: u32,

    // === Precision input ===
    pub input: PrecisionInput,
    pub input_buffer: InputBuffer,
    pub air: AirControl,
    pub slide: SlideControl,
    pub pending_tap: PendingTap,

    // === Timed physics effects ===
    pub gravity_multiplier: f64,
    /// Seconds of float remaining
    pub float_duration: f64,
    pub ceiling_stuck_frames: u32,

    // === Trails ===
    pub trail: Vec<TrailPoint>,
    pub ghost_trail: Vec<GhostFrame>,
    pub run_trail: Vec<DVec2>,
    pub flight_frames: u32,
    /// Last position before the edge, for fall feedback
    pub last_valid_px: f64,

    // === Cinematics ===
    pub cinematic: Cinematic,
    pub tutorial: TutorialState,

    // === Rings ===
    pub rings: Vec<Ring>,
    pub ring_multiplier: f64,
    pub rings_passed_this_throw: u32,

    // === Outcome ===
    pub dist: f64,
    pub fell_off: bool,
    pub perfect_landing: bool,
    pub last_multiplier: f64,
    pub current_multiplier: f64,
    pub last_dist: Option<f64>,
    pub near_miss: Option<NearMiss>,
    pub failure: Option<FailureAnimation>,

    // === Progression ===
    pub progress: Progress,
    pub hot_streak: u32,
    pub landings_without_fall: u32,
    pub session_throws: u32,

    pub(crate) rng: Pcg32,
}

impl SessionState {
    /// Create the session from persisted progress
    pub fn new(seed: u64, progress: Progress) -> Self {
        let progress = progress.normalized();
        let tutorial = TutorialState::new(progress.tutorial_seen);
        let rings = generate_rings(seed.wrapping_add(progress.stats.total_throws as u64));
        let mut rng = Pcg32::seed_from_u64(seed);
        let wind = rng.random_range(-0.05..0.05);

        Self {
            seed,
            phase: ThrowPhase::Idle,
            pos: DVec2::new(LAUNCH_PAD_X, GROUND_Y),
            vel: DVec2::ZERO,
            angle_deg: OPTIMAL_ANGLE,
            initial_speed: 0.0,
            wind,
            try_count: 0,
            paused: false,
            practice_mode: false,
            stamina: MAX_STAMINA,
            stamina_used_this_throw: 0.0,
            stamina_denied_shake: 0,
            input: PrecisionInput::default(),
            input_buffer: InputBuffer::default(),
            air: AirControl::default(),
            slide: SlideControl::default(),
            pending_tap: PendingTap::None,
            gravity_multiplier: 1.0,
            float_duration: 0.0,
            ceiling_stuck_frames: 0,
            trail: Vec::new(),
            ghost_trail: Vec::new(),
            run_trail: Vec::new(),
            flight_frames: 0,
            last_valid_px: 0.0,
            cinematic: Cinematic::default(),
            tutorial,
            rings,
            ring_multiplier: 1.0,
            rings_passed_this_throw: 0,
            dist: 0.0,
            fell_off: false,
            perfect_landing: false,
            last_multiplier: 1.0,
            current_multiplier: 1.0,
            last_dist: None,
            near_miss: None,
            failure: None,
            progress,
            hot_streak: 0,
            landings_without_fall: 0,
            session_throws: 0,
            rng,
        }
    }

    /// Re-initialise every per-throw field. Progression survives.
    pub fn reset_throw(&mut self) {
        self.phase = ThrowPhase::Idle;
        self.pos = DVec2::new(LAUNCH_PAD_X, GROUND_Y);
        self.vel = DVec2::ZERO;
        self.initial_speed = 0.0;
        self.stamina = MAX_STAMINA;
        self.stamina_used_this_throw = 0.0;
        self.stamina_denied_shake = 0;
        self.input = PrecisionInput::default();
        self.input_buffer.clear();
        self.air = AirControl::default();
        self.slide = SlideControl::default();
        self.pending_tap = PendingTap::None;
        self.gravity_multiplier = 1.0;
        self.float_duration = 0.0;
        self.ceiling_stuck_frames = 0;
        self.trail.clear();
        self.ghost_trail.clear();
        self.run_trail.clear();
        self.flight_frames = 0;
        self.last_valid_px = 0.0;
        self.cinematic = Cinematic::default();
        self.rings = generate_rings(
            self.seed
                .wrapping_add(self.progress.stats.total_throws as u64)
                .wrapping_add(self.try_count as u64),
        );
        self.ring_multiplier = 1.0;
        self.rings_passed_this_throw = 0;
        self.fell_off = false;
        self.perfect_landing = false;
        self.current_multiplier = 1.0;
        self.near_miss = None;
        self.failure = None;
        log::debug!("Throw reset (try {})", self.try_count);
    }

    /// Set the launch angle (degrees), clamped to the allowed range
    pub fn set_angle(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.angle_deg = degrees.clamp(MIN_ANGLE, MAX_ANGLE);
        }
    }

    /// Record an unlocked achievement. Returns true if it was new.
    pub fn unlock_achievement(&mut self, id: &str) -> bool {
        let added = self.progress.achievements.insert(id.to_string());
        if added {
            log::info!("Achievement unlocked: {}", id);
        }
        added
    }

    /// Cycle the wind: alternate direction, step magnitude every 3 tries
    pub fn next_wind(&mut self) {
        const LEVELS: [f64; 3] = [0.02, 0.05, 0.08];
        let direction = if self.try_count % 2 == 0 { 1.0 } else { -1.0 };
        let level = (self.try_count / 3) as usize % LEVELS.len();
        self.wind = direction * LEVELS[level];
        log::debug!("Wind now {:.2}", self.wind);
    }
}
