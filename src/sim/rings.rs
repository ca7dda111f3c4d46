//! Multiplier rings
//!
//! Three moving rings per throw, one per zone along the trajectory. Flying
//! through one multiplies the throw's ring multiplier.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{FrameHooks, OutcomeEvent};
use super::state::SessionState;
use crate::audio::{SoundCue, haptics};
use crate::consts::*;
use crate::settings::Settings;

/// Multipliers per ring, escalating
pub const RING_MULTIPLIERS: [f64; 3] = [1.1, 1.25, 1.5];
/// Hit radius around the ring centre
pub const RING_HIT_RADIUS: f64 = 20.0;
/// Collecting a ring freezes time briefly unless slow-mo is already heavy
const MICRO_FREEZE_BELOW: f64 = 0.5;
const MICRO_FREEZE_SLOW_MO: f64 = 0.95;
const RING_FLASH: f64 = 0.3;
const FINAL_RING_FLASH: f64 = 0.5;

/// Horizontal zones (min x, max x) for each ring
const RING_ZONES: [(f64, f64); 3] = [(100.0, 180.0), (200.0, 320.0), (330.0, 400.0)];

/// Motion pattern with its parameters (times in ms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RingPattern {
    /// Vertical bob
    Oscillate {
        amplitude: f64,
        frequency: f64,
        phase: f64,
    },
    /// Circle around the anchor
    Orbit {
        radius: f64,
        speed: f64,
        clockwise: bool,
    },
    /// Figure-eight style sweep
    Lissajous {
        amp_x: f64,
        amp_y: f64,
        freq_ratio: f64,
        phase: f64,
        speed: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub anchor: DVec2,
    pub pos: DVec2,
    pub pattern: RingPattern,
    pub initial_angle: f64,
    /// 0, 1 or 2
    pub index: u8,
    pub passed: bool,
    pub passed_at_ms: Option<f64>,
}

impl Ring {
    /// Move the ring along its pattern
    pub fn update_position(&mut self, time_ms: f64) {
        self.pos = match self.pattern {
            RingPattern::Oscillate {
                amplitude,
                frequency,
                phase,
            } => DVec2::new(
                self.anchor.x,
                self.anchor.y + amplitude * (frequency * time_ms + phase).sin(),
            ),
            RingPattern::Orbit {
                radius,
                speed,
                clockwise,
            } => {
                let direction = if clockwise { 1.0 } else { -1.0 };
                let angle = direction * speed * time_ms + self.initial_angle;
                self.anchor + radius * DVec2::new(angle.cos(), angle.sin())
            }
            RingPattern::Lissajous {
                amp_x,
                amp_y,
                freq_ratio,
                phase,
                speed,
            } => {
                let t = time_ms * speed;
                self.anchor + DVec2::new(amp_x * t.sin(), amp_y * (freq_ratio * t + phase).sin())
            }
        };
    }

    /// Whether a point passes through this ring
    pub fn hit(&self, point: DVec2) -> bool {
        !self.passed && point.distance(self.pos) < RING_HIT_RADIUS
    }
}

/// Anchor height roughly following a launch arc, randomized and clamped
fn anchor_y(x: f64, rng: &mut Pcg32) -> f64 {
    let progress = x / CLIFF_EDGE;
    let arc_y = (WORLD_HEIGHT - 30.0) - 100.0 * (progress * PI).sin();
    let offset = (rng.random::<f64>() - 0.5) * 80.0;
    (arc_y + offset).clamp(60.0, WORLD_HEIGHT - 60.0)
}

fn pattern_for(index: usize, rng: &mut Pcg32) -> RingPattern {
    match index {
        0 => RingPattern::Oscillate {
            amplitude: rng.random_range(40.0..80.0),
            frequency: rng.random_range(0.0017..0.00425),
            phase: rng.random_range(0.0..TAU),
        },
        1 => RingPattern::Orbit {
            radius: rng.random_range(35.0..70.0),
            speed: rng.random_range(0.00085..0.0034),
            clockwise: rng.random_bool(0.5),
        },
        _ => RingPattern::Lissajous {
            amp_x: rng.random_range(50.0..90.0),
            amp_y: rng.random_range(35.0..65.0),
            freq_ratio: rng.random_range(1.0..3.0),
            phase: rng.random_range(0.0..PI),
            speed: rng.random_range(0.00085..0.00255),
        },
    }
}

/// Deterministic ring layout for a seed
pub fn generate_rings(seed: u64) -> Vec<Ring> {
    RING_ZONES
        .iter()
        .enumerate()
        .map(|(index, &(min_x, max_x))| {
            let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(index as u64 * 1000));
            let x = rng.random_range(min_x..max_x);
            let anchor = DVec2::new(x, anchor_y(x, &mut rng));
            let pattern = pattern_for(index, &mut rng);
            Ring {
                anchor,
                pos: anchor,
                pattern,
                initial_angle: rng.random_range(0.0..TAU),
                index: index as u8,
                passed: false,
                passed_at_ms: None,
            }
        })
        .collect()
}

/// Move rings and collect any the thrower flies through this frame
pub fn update_rings(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let pos = state.pos;
    let mut collected = Vec::new();
    for ring in state.rings.iter_mut() {
        ring.update_position(now_ms);
        if ring.hit(pos) {
            ring.passed = true;
            ring.passed_at_ms = Some(now_ms);
            collected.push(ring.index);
        }
    }

    for index in collected {
        state.rings_passed_this_throw += 1;
        state.ring_multiplier *= RING_MULTIPLIERS[index as usize % RING_MULTIPLIERS.len()];

        if state.cinematic.slow_mo.get() < MICRO_FREEZE_BELOW {
            state.cinematic.slow_mo.at_least(MICRO_FREEZE_SLOW_MO);
        }
        if !settings.reduce_fx {
            let flash = if state.rings_passed_this_throw >= 3 {
                FINAL_RING_FLASH
            } else {
                RING_FLASH
            };
            state.cinematic.flash.set(flash);
        }

        log::debug!(
            "Ring {} collected, multiplier {:.4}",
            index,
            state.ring_multiplier
        );
        hooks.play(SoundCue::RingCollect { index });
        if settings.haptics {
            hooks.haptic(haptics::RING);
        }
        hooks.outcome(OutcomeEvent::RingCollected {
            index,
            ring_multiplier: state.ring_multiplier,
        });
    }
}
