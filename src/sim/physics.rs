//! Physics integrator
//!
//! Flight: gravity, air friction, wind, sticky ceiling.
//! Slide: exponential friction toward rest.
//! Both record trail history for rendering.

use glam::DVec2;

use super::precision::{decay_float, effective_gravity_multiplier, is_air_braking};
use super::state::{GhostFrame, SessionState, TrailPoint};
use crate::consts::*;

/// Air friction while floating (gravity well below normal)
const FLOAT_AIR_FRICTION: f64 = 0.998;
/// Air friction otherwise
const AIR_FRICTION: f64 = 0.992;
/// Gravity multiplier below which the thrower counts as floating
const FLOATING_GRAVITY: f64 = 0.5;
/// Wind strength scale
const WIND_FACTOR: f64 = 0.3;
/// Ceiling stick frames per unit of upward speed
const CEILING_STICK_PER_SPEED: f64 = 6.0;
/// Horizontal damping while stuck to the ceiling
const CEILING_DRAG: f64 = 0.995;
/// Pre-impact |vy| that maps to full impact intensity
const FULL_IMPACT_SPEED: f64 = 4.0;

/// Advance one flying frame at `time_scale`
pub fn integrate_flight(state: &mut SessionState, time_scale: f64, now_ms: f64) {
    let gravity_multiplier = effective_gravity_multiplier(state, now_ms);
    state.vel.y += BASE_GRAVITY * time_scale * gravity_multiplier;

    state.vel.x *= if gravity_multiplier < FLOATING_GRAVITY {
        FLOAT_AIR_FRICTION
    } else {
        AIR_FRICTION
    };

    let wind_resistance = if is_air_braking(state) { 0.5 } else { 1.0 };
    state.vel.x += state.wind * WIND_FACTOR * time_scale * wind_resistance;

    state.pos += state.vel * time_scale;

    if state.ceiling_stuck_frames > 0 {
        state.pos.y = CEILING_Y;
        state.vel.y = 0.0;
        state.ceiling_stuck_frames -= 1;
        state.vel.x *= CEILING_DRAG;
    } else if state.pos.y < CEILING_Y {
        state.ceiling_stuck_frames = (state.vel.y.abs() * CEILING_STICK_PER_SPEED).round() as u32;
        state.pos.y = CEILING_Y;
        state.vel.y = 0.0;
        log::debug!("Stuck to ceiling for {} frames", state.ceiling_stuck_frames);
    }

    decay_float(state, time_scale * FRAME_DT);

    state.flight_frames += 1;
    record_trail(state);
    record_ghost(state, now_ms);
    if state.flight_frames % 2 == 1 {
        state.run_trail.push(state.pos);
    }
    if state.pos.x < CLIFF_EDGE {
        state.last_valid_px = state.pos.x;
    }
}

/// Ground contact check. On contact the thrower is clamped to the ground,
/// horizontal speed is cut and the impact intensity (0..1) is returned.
pub fn ground_contact(state: &mut SessionState) -> Option<f64> {
    if state.pos.y < GROUND_Y {
        return None;
    }
    let impact = (state.vel.y.abs() / FULL_IMPACT_SPEED).min(1.0);
    state.pos.y = GROUND_Y;
    state.vel.x *= IMPACT_RESTITUTION;
    state.vel.y = 0.0;
    Some(impact)
}

/// Slide friction factor for one frame
#[inline]
pub fn slide_friction(time_scale: f64, friction_multiplier: f64) -> f64 {
    SLIDE_FRICTION.powf(time_scale * friction_multiplier)
}

/// Advance one sliding frame
pub fn integrate_slide(state: &mut SessionState, time_scale: f64, friction_multiplier: f64) {
    state.vel.x *= slide_friction(time_scale, friction_multiplier);
    state.pos.x += state.vel.x * time_scale;
    record_trail(state);
    if state.pos.x < CLIFF_EDGE {
        state.last_valid_px = state.pos.x;
    }
}

/// Age trail points and drop the stale ones
pub fn age_trail(trail: &mut Vec<TrailPoint>) {
    for point in trail.iter_mut() {
        point.age += 1;
    }
    trail.retain(|p| p.age <= TRAIL_MAX_AGE);
}

fn record_trail(state: &mut SessionState) {
    let past_target = state.pos.x >= state.progress.zeno_target;
    state.trail.push(TrailPoint {
        pos: state.pos,
        age: 0,
        past_target,
    });
}

fn record_ghost(state: &mut SessionState, now_ms: f64) {
    let last = state.ghost_trail.last().map_or(0.0, |g| g.timestamp_ms);
    if now_ms - last <= GHOST_INTERVAL_MS {
        return;
    }
    state.ghost_trail.push(GhostFrame {
        pos: state.pos,
        vel: state.vel,
        angle: (-state.vel.y).atan2(state.vel.x),
        timestamp_ms: now_ms,
    });
    if state.ghost_trail.len() > GHOST_TRAIL_LENGTH {
        state.ghost_trail.remove(0);
    }
}

/// Launch velocity from power and angle (y grows downward)
pub fn launch_velocity(power: f64, angle_deg: f64) -> DVec2 {
    let angle = angle_deg.to_radians();
    DVec2::new(power * angle.cos(), -power * angle.sin())
}
