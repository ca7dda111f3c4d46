//! Charge and launch
//!
//! Holding the control on the pad sweeps power up and down as a triangle
//! wave. Releasing launches with the power sampled on that frame.

use super::events::{FrameHooks, OutcomeEvent};
use super::physics::launch_velocity;
use super::state::{SessionState, ThrowPhase};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::Settings;

/// Zoom nudge when the charge enters the sweet spot
const SWEET_SPOT_ZOOM: f64 = 1.02;

/// Charge power (0..1) after `elapsed_ms` of holding: 0 → 1 → 0 → ...
pub fn charge_power(elapsed_ms: f64) -> f64 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0.0;
    }
    let cycle = (elapsed_ms % (CHARGE_MS * 2.0)) / CHARGE_MS;
    if cycle <= 1.0 { cycle } else { 2.0 - cycle }
}

/// Launch speed for a charge level
pub fn launch_power(charge: f64) -> f64 {
    MIN_POWER + (MAX_POWER - MIN_POWER) * charge.clamp(0.0, 1.0)
}

pub fn in_sweet_spot(charge: f64) -> bool {
    (SWEET_SPOT_MIN..=SWEET_SPOT_MAX).contains(&charge)
}

/// Idle → Charging
pub fn start_charge(state: &mut SessionState, now_ms: f64, hooks: &mut impl FrameHooks) {
    state.phase = ThrowPhase::Charging {
        started_ms: now_ms,
        power: 0.0,
    };
    state.cinematic.sweet_spot = false;
    hooks.play(SoundCue::ChargeStart);
}

/// Update power while the control stays held
pub fn update_charge(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let ThrowPhase::Charging { started_ms, .. } = state.phase else {
        return;
    };
    let power = charge_power(now_ms - started_ms);
    state.phase = ThrowPhase::Charging { started_ms, power };

    let sweet = in_sweet_spot(power);
    if sweet && !state.cinematic.sweet_spot {
        hooks.play(SoundCue::SweetSpotClick);
        if !settings.reduce_fx {
            state.cinematic.zoom.set(SWEET_SPOT_ZOOM);
        }
    }
    state.cinematic.sweet_spot = sweet;
}

/// Charging → Flying. Pays for the throw and sets the launch velocity.
pub fn launch(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let ThrowPhase::Charging { power: charge, .. } = state.phase else {
        return;
    };

    let grant = hooks.consume_throw();
    state.practice_mode = grant.is_practice();

    let power = launch_power(charge);
    state.vel = launch_velocity(power, state.angle_deg);
    state.initial_speed = power;
    state.phase = ThrowPhase::Flying { launched_ms: now_ms };
    state.trail.clear();
    state.ghost_trail.clear();
    state.run_trail.clear();
    state.flight_frames = 0;
    state.air = Default::default();
    state.stamina_used_this_throw = 0.0;
    state.cinematic.sweet_spot = false;
    state.session_throws += 1;

    log::info!(
        "Launch: charge {:.2} power {:.2} angle {:.0} ({:?})",
        charge,
        power,
        state.angle_deg,
        grant
    );
    hooks.play(SoundCue::Launch);
    if settings.haptics {
        hooks.haptic(crate::audio::haptics::LAUNCH);
    }
    hooks.outcome(OutcomeEvent::Launched { grant });
}
