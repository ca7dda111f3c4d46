//! Precision control mappers
//!
//! Air: tap floats, hold brakes, thrust boosts forward.
//! Slide: tap extends, hold brakes.
//!
//! Taps apply on press so they feel instant. If the press turns into a hold
//! the tap is reverted when the grace window expires and hold logic takes
//! over. Every action is stamina-gated through `SessionState::try_spend`,
//! which either deducts the full cost or changes nothing.

use serde::{Deserialize, Serialize};

use super::events::FrameHooks;
use super::stamina::{ActionResult, continuous_cost, discrete_cost};
use super::state::SessionState;
use crate::audio::{SoundCue, haptics};
use crate::consts::FRAME_DT;
use crate::settings::Settings;

// === Air float ===
pub const FLOAT_GRAVITY: f64 = 0.5;
/// Seconds of simulated time
pub const FLOAT_DURATION: f64 = 0.3;
pub const FLOAT_COST: f64 = 5.0;
/// Taps inside this window thin gravity further
pub const TAP_WINDOW_MS: f64 = 600.0;
pub const TAP_GRAVITY_STEP: f64 = 0.05;
pub const MIN_TAP_GRAVITY: f64 = 0.3;

// === Air brake ===
/// Held frames before the air brake engages
pub const BRAKE_ACTIVATION_FRAMES: u32 = 6;
pub const AIR_BRAKE_COST_PER_SEC: f64 = 15.0;
/// Per-frame velocity factor when the brake engages
pub const AIR_BRAKE_INITIAL: f64 = 0.97;
/// Per-frame factor once the brake is fully on
pub const AIR_BRAKE_FULL: f64 = 0.95;
const AIR_BRAKE_RAMP_FRAMES: f64 = 30.0;

// === Thrust ===
pub const THRUST_BOOST: f64 = 1.0;
pub const THRUST_COST: f64 = 6.0;
/// Thrust cannot push vx past this multiple of the launch speed
pub const THRUST_CAP: f64 = 1.6;

// === Slide ===
pub const SLIDE_EXTEND_VELOCITY: f64 = 0.15;
pub const SLIDE_EXTEND_COST: f64 = 8.0;
pub const SLIDE_BRAKE_FRICTION: f64 = 2.5;
pub const SLIDE_BRAKE_COST_PER_SEC: f64 = 10.0;

/// Hold cues repeat every this many frames
const HOLD_CUE_INTERVAL: u32 = 6;

/// An optimistic tap effect that is undone if the press becomes a hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PendingTap {
    #[default]
    None,
    Float {
        prev_multiplier: f64,
        prev_duration: f64,
    },
    Extend {
        velocity: f64,
    },
}

/// Slide brake result with the friction exponent multiplier it implies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideBrake {
    pub result: ActionResult,
    pub friction_multiplier: f64,
}

/// Tap in the air: halve gravity for a short time.
///
/// Repeat taps refresh the timer instead of stacking.
pub fn apply_air_float(state: &mut SessionState, now_ms: f64) -> ActionResult {
    if !state.try_spend(discrete_cost(FLOAT_COST, state.pos.x)) {
        return ActionResult::DENIED;
    }
    state.pending_tap = PendingTap::Float {
        prev_multiplier: state.gravity_multiplier,
        prev_duration: state.float_duration,
    };
    state.gravity_multiplier = FLOAT_GRAVITY;
    state.float_duration = FLOAT_DURATION;
    state.air.float_taps += 1;
    state
        .air
        .recent_tap_times
        .retain(|t| now_ms - *t < TAP_WINDOW_MS);
    state.air.recent_tap_times.push(now_ms);
    ActionResult::APPLIED
}

/// Gravity multiplier for this frame.
///
/// Normal while braking. While a float is active, each extra tap in the
/// recent window lowers it a little further, down to `MIN_TAP_GRAVITY`.
pub fn effective_gravity_multiplier(state: &SessionState, now_ms: f64) -> f64 {
    if state.air.is_holding_brake {
        return 1.0;
    }
    if state.float_duration <= 0.0 {
        return state.gravity_multiplier;
    }
    let taps = state
        .air
        .recent_tap_times
        .iter()
        .filter(|t| now_ms - **t < TAP_WINDOW_MS)
        .count();
    let extra = taps.saturating_sub(1) as f64;
    (state.gravity_multiplier - TAP_GRAVITY_STEP * extra).max(MIN_TAP_GRAVITY)
}

/// Run down the float timer by `dt` seconds of simulated time
pub fn decay_float(state: &mut SessionState, dt: f64) {
    if state.float_duration <= 0.0 {
        return;
    }
    state.float_duration -= dt;
    if state.float_duration <= 0.0 {
        state.float_duration = 0.0;
        state.gravity_multiplier = 1.0;
    }
}

/// Held brake in the air. Eases from 0.97 to 0.95 per frame as the hold goes on.
pub fn apply_air_brake(state: &mut SessionState, frames_past_threshold: u32, dt: f64) -> ActionResult {
    if !state.try_spend(continuous_cost(AIR_BRAKE_COST_PER_SEC, state.pos.x, dt)) {
        return ActionResult::DENIED;
    }
    let ramp = (frames_past_threshold as f64 / AIR_BRAKE_RAMP_FRAMES).min(1.0);
    let factor = AIR_BRAKE_INITIAL + (AIR_BRAKE_FULL - AIR_BRAKE_INITIAL) * ramp;
    state.vel *= factor;
    state.air.is_holding_brake = true;
    state.air.brake_frames += 1;
    state.air.throttle_ms_used += dt * 1000.0;
    ActionResult::APPLIED
}

/// Forward boost, capped relative to the launch speed.
///
/// At the cap the thrust is denied without touching stamina.
pub fn apply_thrust(state: &mut SessionState) -> ActionResult {
    let cap = state.initial_speed * THRUST_CAP;
    if state.vel.x >= cap {
        return ActionResult::DENIED;
    }
    if !state.try_spend(discrete_cost(THRUST_COST, state.pos.x)) {
        return ActionResult::DENIED;
    }
    state.vel.x = (state.vel.x + THRUST_BOOST).min(cap);
    state.air.thrust_taps += 1;
    ActionResult::APPLIED
}

/// Tap while sliding: push a little further in the direction of travel
pub fn apply_slide_extend(state: &mut SessionState) -> ActionResult {
    if state.vel.x == 0.0 {
        return ActionResult::NONE;
    }
    if !state.try_spend(discrete_cost(SLIDE_EXTEND_COST, state.pos.x)) {
        return ActionResult::DENIED;
    }
    state.vel.x += SLIDE_EXTEND_VELOCITY * state.vel.x.signum();
    state.pending_tap = PendingTap::Extend {
        velocity: SLIDE_EXTEND_VELOCITY,
    };
    state.slide.extend_taps += 1;
    ActionResult::APPLIED
}

/// Hold while sliding: stronger friction for this frame
pub fn apply_slide_brake(state: &mut SessionState, dt: f64) -> SlideBrake {
    if !state.try_spend(continuous_cost(SLIDE_BRAKE_COST_PER_SEC, state.pos.x, dt)) {
        return SlideBrake {
            result: ActionResult::DENIED,
            friction_multiplier: 1.0,
        };
    }
    state.slide.brake_frames += 1;
    SlideBrake {
        result: ActionResult::APPLIED,
        friction_multiplier: SLIDE_BRAKE_FRICTION,
    }
}

/// Undo an optimistic tap whose press became a hold. Stamina is not refunded.
pub fn revert_pending_tap(state: &mut SessionState) {
    match std::mem::take(&mut state.pending_tap) {
        PendingTap::None => {}
        PendingTap::Float {
            prev_multiplier,
            prev_duration,
        } => {
            state.gravity_multiplier = prev_multiplier;
            state.float_duration = prev_duration;
        }
        PendingTap::Extend { velocity } => {
            if state.vel.x > 0.0 {
                state.vel.x = (state.vel.x - velocity).max(0.0);
            } else if state.vel.x < 0.0 {
                state.vel.x = (state.vel.x + velocity).min(0.0);
            }
        }
    }
}

/// Holding long enough for the air brake
pub fn is_air_braking(state: &SessionState) -> bool {
    state.input.last_pressed_state && state.input.hold_duration > BRAKE_ACTIVATION_FRAMES
}

/// Shared tap bookkeeping: confirm quick releases (including a buffered
/// tap on its press frame), revert expired taps
fn settle_pending_tap(state: &mut SessionState) {
    if state.input.is_tap_release() {
        state.pending_tap = PendingTap::None;
    } else if state.input.grace_expired_this_frame() {
        revert_pending_tap(state);
    }
}

/// Denied feedback: buzz and, if enabled, a short vibration
fn deny(settings: &Settings, hooks: &mut impl FrameHooks) {
    hooks.play(SoundCue::ActionDenied);
    if settings.haptics {
        hooks.haptic(haptics::DENIED);
    }
}

fn report(
    result: ActionResult,
    cue: SoundCue,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) -> bool {
    if result.applied {
        hooks.play(cue);
    } else if result.denied {
        deny(settings, hooks);
    }
    result.applied
}

/// Air mappers for one flying frame. Returns true if any action applied.
pub fn air_controls(
    state: &mut SessionState,
    now_ms: f64,
    thrust: bool,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) -> bool {
    let mut applied = false;

    if state.input.pressed_this_frame {
        let result = apply_air_float(state, now_ms);
        applied |= report(result, SoundCue::AirFloat, settings, hooks);
    }
    settle_pending_tap(state);

    if is_air_braking(state) {
        let hold = state.input.hold_duration;
        let result = apply_air_brake(state, hold - BRAKE_ACTIVATION_FRAMES - 1, FRAME_DT);
        if result.applied {
            applied = true;
            if hold % HOLD_CUE_INTERVAL == 0 {
                hooks.play(SoundCue::AirBrake);
            }
        } else {
            state.air.is_holding_brake = false;
            if hold % HOLD_CUE_INTERVAL == 0 {
                deny(settings, hooks);
            }
        }
    } else {
        state.air.is_holding_brake = false;
    }

    if thrust {
        let result = apply_thrust(state);
        applied |= report(result, SoundCue::Thrust, settings, hooks);
    }

    applied
}

/// Slide mappers for one sliding frame.
///
/// Skips actions if the air mappers already acted this frame. Returns the
/// friction multiplier for the slide integrator.
pub fn slide_controls(
    state: &mut SessionState,
    already_applied: bool,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) -> f64 {
    let mut applied = already_applied;

    if state.input.pressed_this_frame && !applied {
        let result = apply_slide_extend(state);
        applied = report(result, SoundCue::SlideExtend, settings, hooks);
    }
    settle_pending_tap(state);

    if state.input.is_holding() && !applied {
        let hold = state.input.hold_duration;
        let brake = apply_slide_brake(state, FRAME_DT);
        if brake.result.applied {
            if hold % HOLD_CUE_INTERVAL == 0 {
                hooks.play(SoundCue::SlideBrake);
            }
            return brake.friction_multiplier;
        }
        if hold % HOLD_CUE_INTERVAL == 0 {
            deny(settings, hooks);
        }
    }
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::events::RecordingHooks;
    use crate::sim::input::{BufferedFacts, TAP_GRACE_FRAMES};
    use crate::sim::stamina::edge_multiplier;
    use crate::sim::state::{Progress, ThrowPhase};
    use glam::DVec2;

    fn flying_at(px: f64) -> SessionState {
        let mut state = SessionState::new(11, Progress::default());
        state.phase = ThrowPhase::Flying { launched_ms: 0.0 };
        state.pos = DVec2::new(px, 100.0);
        state.vel = DVec2::new(5.0, -2.0);
        state.initial_speed = 7.0;
        state
    }

    #[test]
    fn test_float_tap_in_safe_zone() {
        let mut state = flying_at(300.0);
        let result = apply_air_float(&mut state, 1000.0);
        assert_eq!(result, ActionResult::APPLIED);
        assert_eq!(state.stamina, 95.0);
        assert_eq!(state.gravity_multiplier, 0.5);
        assert_eq!(state.float_duration, 0.3);
    }

    #[test]
    fn test_float_never_stacks() {
        let mut state = flying_at(300.0);
        apply_air_float(&mut state, 1000.0);
        decay_float(&mut state, 0.1);
        apply_air_float(&mut state, 1050.0);
        assert_eq!(state.gravity_multiplier, FLOAT_GRAVITY);
        assert_eq!(state.float_duration, FLOAT_DURATION);
        assert_eq!(state.stamina, 90.0);
    }

    #[test]
    fn test_denied_float_changes_nothing() {
        let mut state = flying_at(300.0);
        state.stamina = 4.0;
        let vel = state.vel;
        let result = apply_air_float(&mut state, 0.0);
        assert_eq!(result, ActionResult::DENIED);
        assert_eq!(state.stamina, 4.0);
        assert_eq!(state.gravity_multiplier, 1.0);
        assert_eq!(state.float_duration, 0.0);
        assert_eq!(state.vel, vel);
        assert_eq!(state.stamina_denied_shake, DENIED_SHAKE_FRAMES);
    }

    #[test]
    fn test_denied_slide_extend_changes_nothing() {
        let mut state = flying_at(410.0);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.vel = DVec2::new(1.0, 0.0);
        state.stamina = 10.0;
        let phase = state.phase;

        assert_eq!(apply_slide_extend(&mut state), ActionResult::DENIED);
        assert_eq!(state.vel.x, 1.0);
        assert_eq!(state.stamina, 10.0);
        assert_eq!(state.stamina_used_this_throw, 0.0);
        assert_eq!(state.stamina_denied_shake, DENIED_SHAKE_FRAMES);
        assert_eq!(state.pending_tap, PendingTap::None);
        assert_eq!(state.phase, phase);
    }

    #[test]
    fn test_denied_slide_brake_keeps_friction() {
        let mut state = flying_at(410.0);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.vel = DVec2::new(1.0, 0.0);
        state.stamina = 0.1;

        let brake = apply_slide_brake(&mut state, FRAME_DT);
        assert_eq!(brake.result, ActionResult::DENIED);
        assert_eq!(brake.friction_multiplier, 1.0);
        assert_eq!(state.vel, DVec2::new(1.0, 0.0));
        assert_eq!(state.stamina, 0.1);
        assert_eq!(state.slide.brake_frames, 0);
    }

    #[test]
    fn test_denied_air_brake_keeps_velocity() {
        let mut state = flying_at(410.0);
        state.stamina = 0.2;
        let vel = state.vel;

        assert_eq!(apply_air_brake(&mut state, 0, FRAME_DT), ActionResult::DENIED);
        assert!(!state.air.is_holding_brake);
        assert_eq!(state.vel, vel);
        assert_eq!(state.stamina, 0.2);
        assert_eq!(state.air.brake_frames, 0);
        assert!(state.phase.is_flying());
    }

    #[test]
    fn test_denial_buzzes_when_haptics_enabled() {
        let mut state = flying_at(200.0);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.vel = DVec2::new(2.0, 0.0);
        state.stamina = 0.0;
        let mut hooks = RecordingHooks::default();
        state.input.update(true, BufferedFacts::default());
        slide_controls(&mut state, false, &Settings::default(), &mut hooks);
        assert!(hooks.played(SoundCue::ActionDenied));
        assert_eq!(hooks.haptics, vec![haptics::DENIED.to_vec()]);

        let quiet = Settings {
            haptics: false,
            ..Default::default()
        };
        let mut hooks = RecordingHooks::default();
        let mut state = flying_at(200.0);
        state.stamina = 0.0;
        state.input.update(true, BufferedFacts::default());
        air_controls(&mut state, 0.0, false, &quiet, &mut hooks);
        assert!(hooks.played(SoundCue::ActionDenied));
        assert!(hooks.haptics.is_empty());
    }

    #[test]
    fn test_tap_frequency_thins_gravity() {
        let mut state = flying_at(100.0);
        apply_air_float(&mut state, 0.0);
        apply_air_float(&mut state, 100.0);
        apply_air_float(&mut state, 200.0);
        let gm = effective_gravity_multiplier(&state, 200.0);
        assert!((gm - 0.4).abs() < 1e-12);
        assert_eq!(state.gravity_multiplier, FLOAT_GRAVITY);

        state.air.is_holding_brake = true;
        assert_eq!(effective_gravity_multiplier(&state, 200.0), 1.0);
    }

    #[test]
    fn test_float_expires() {
        let mut state = flying_at(100.0);
        apply_air_float(&mut state, 0.0);
        decay_float(&mut state, 0.31);
        assert_eq!(state.float_duration, 0.0);
        assert_eq!(state.gravity_multiplier, 1.0);
    }

    #[test]
    fn test_thrust_capped_without_spending() {
        let mut state = flying_at(100.0);
        state.vel.x = state.initial_speed * THRUST_CAP;
        assert_eq!(apply_thrust(&mut state), ActionResult::DENIED);
        assert_eq!(state.stamina, MAX_STAMINA);
        assert_eq!(state.stamina_denied_shake, 0);

        state.vel.x = 10.8;
        assert_eq!(apply_thrust(&mut state), ActionResult::APPLIED);
        assert!((state.vel.x - 11.2).abs() < 1e-12);
        assert_eq!(state.stamina, 94.0);
    }

    #[test]
    fn test_slide_extend_near_edge() {
        let mut state = flying_at(410.0);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.vel = DVec2::new(1.0, 0.0);
        let result = apply_slide_extend(&mut state);
        assert!(result.applied);
        let expected = 100.0 - (8.0 * edge_multiplier(410.0)).ceil();
        assert_eq!(state.stamina, expected);
        assert_eq!(state.stamina, 86.0);
        assert!((state.vel.x - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_slide_extend_noop_when_stopped() {
        let mut state = flying_at(200.0);
        state.vel = DVec2::ZERO;
        assert_eq!(apply_slide_extend(&mut state), ActionResult::NONE);
        assert_eq!(state.stamina, MAX_STAMINA);
    }

    #[test]
    fn test_hold_reverts_extend_and_brakes() {
        let mut state = flying_at(200.0);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.vel = DVec2::new(2.0, 0.0);
        let mut hooks = RecordingHooks::default();

        let mut friction = 1.0;
        for _ in 0..=TAP_GRACE_FRAMES {
            state.input.update(true, BufferedFacts::default());
            friction = slide_controls(&mut state, false, &Settings::default(), &mut hooks);
        }
        // Extend reverted on the frame grace expired, brake engaged the same frame
        assert!((state.vel.x - 2.0).abs() < 1e-12);
        assert_eq!(friction, SLIDE_BRAKE_FRICTION);
        assert!(hooks.played(SoundCue::SlideExtend));
        assert_eq!(state.pending_tap, PendingTap::None);
    }

    #[test]
    fn test_quick_release_confirms_float() {
        let mut state = flying_at(200.0);
        let mut hooks = RecordingHooks::default();
        state.input.update(true, BufferedFacts::default());
        air_controls(&mut state, 0.0, false, &Settings::default(), &mut hooks);
        state.input.update(false, BufferedFacts::default());
        air_controls(&mut state, 16.0, false, &Settings::default(), &mut hooks);
        assert_eq!(state.pending_tap, PendingTap::None);
        assert_eq!(state.gravity_multiplier, FLOAT_GRAVITY);
        assert!(hooks.played(SoundCue::AirFloat));
    }

    #[test]
    fn test_air_hold_reverts_float_then_brakes() {
        let mut state = flying_at(200.0);
        let mut hooks = RecordingHooks::default();
        for frame in 0..=BRAKE_ACTIVATION_FRAMES {
            state.input.update(true, BufferedFacts::default());
            let now = frame as f64 * 16.0;
            air_controls(&mut state, now, false, &Settings::default(), &mut hooks);
        }
        assert_eq!(state.gravity_multiplier, 1.0);
        assert_eq!(state.float_duration, 0.0);
        assert!(state.air.is_holding_brake);
        assert!((state.vel.x - 5.0 * AIR_BRAKE_INITIAL).abs() < 1e-12);
        assert!(state.stamina < 95.0);
    }

    #[test]
    fn test_slide_skips_after_air_action() {
        let mut state = flying_at(200.0);
        state.vel = DVec2::new(2.0, 0.0);
        let mut hooks = RecordingHooks::default();
        state.input.update(true, BufferedFacts::default());
        slide_controls(&mut state, true, &Settings::default(), &mut hooks);
        assert_eq!(state.stamina, MAX_STAMINA);
        assert_eq!(state.vel.x, 2.0);
    }
}
