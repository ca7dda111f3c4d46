//! Per-frame simulation step
//!
//! Core loop that advances one throw frame by frame. The order of the
//! stages matters: controls act before physics, cinematics read the
//! post-physics position, and landing resolution sees the final slide.

use super::charge::{launch, start_charge, update_charge};
use super::cinematic::{
    decay_effects, effective_time_scale, impact_feedback, update_cinematics, update_precision_bar,
};
use super::events::{FrameHooks, OutcomeEvent};
use super::landing::{
    resolve_rest, resolve_slide_off, update_failure_animation, update_near_miss_pause,
};
use super::physics::{age_trail, ground_contact, integrate_flight, integrate_slide};
use super::precision::{air_controls, slide_controls};
use super::rings::update_rings;
use super::stamina::low_warning_due;
use super::state::{DailyStats, SessionState, ThrowPhase};
use super::tutorial::{start_tutorial, tutorial_trigger, update_tutorial};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::Settings;
use crate::throws::ThrowGrant;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Raw control level (mouse/touch/space held)
    pub pressed: bool,
    /// Monotonic host timestamp in milliseconds
    pub now_ms: f64,
    /// Forward thrust request (separate control)
    pub thrust: bool,
}

/// Drops decorative cues under reduced effects
struct CueFilter<'a, H: FrameHooks> {
    inner: &'a mut H,
    reduce_fx: bool,
}

impl<H: FrameHooks> FrameHooks for CueFilter<'_, H> {
    fn play(&mut self, cue: SoundCue) {
        if self.reduce_fx && cue.is_ambient() {
            return;
        }
        self.inner.play(cue);
    }

    fn outcome(&mut self, event: OutcomeEvent) {
        self.inner.outcome(event);
    }

    fn haptic(&mut self, pattern: &[u32]) {
        self.inner.haptic(pattern);
    }

    fn schedule_reset(&mut self, delay_ms: u32) {
        self.inner.schedule_reset(delay_ms);
    }

    fn daily_stats(&self) -> DailyStats {
        self.inner.daily_stats()
    }

    fn consume_throw(&mut self) -> ThrowGrant {
        self.inner.consume_throw()
    }
}

/// Advance the session by one frame
pub fn tick(
    state: &mut SessionState,
    input: &FrameInput,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    if state.paused {
        return;
    }
    let mut hooks = CueFilter {
        inner: hooks,
        reduce_fx: settings.reduce_fx,
    };
    let now = input.now_ms;
    let snapshot = (state.pos, state.vel);

    // Heavy slow-mo: hold raw edges until time speeds up again
    let was_buffering = state.input_buffer.is_buffering();
    state.input_buffer.observe(input.pressed, now);
    let buffered = state
        .input_buffer
        .follow_slow_mo(state.cinematic.slow_mo.get(), input.pressed);
    let level = if was_buffering && state.input_buffer.is_buffering() {
        state.input.last_pressed_state
    } else {
        input.pressed
    };

    let prev_vy = state.vel.y;
    if state.phase.in_motion() {
        state.input.update(level, buffered);
    }

    // Charge and launch
    if state.phase.is_idle() && input.pressed {
        start_charge(state, now, &mut hooks);
    }
    if state.phase.is_charging() {
        if input.pressed {
            update_charge(state, now, settings, &mut hooks);
        } else {
            launch(state, now, settings, &mut hooks);
        }
    }

    let tutorial_multiplier = update_tutorial(state, FRAME_DT);
    let time_scale = effective_time_scale(state, tutorial_multiplier);

    if state.phase.in_motion() && low_warning_due(state, now) {
        hooks.play(SoundCue::StaminaLow);
    }

    let mut precision_applied = false;
    if state.phase.is_flying() {
        precision_applied = air_controls(state, now, input.thrust, settings, &mut hooks);
        integrate_flight(state, time_scale, now);
        update_rings(state, now, settings, &mut hooks);
        touch_down(state, settings, &mut hooks);
    }

    age_trail(&mut state.trail);
    update_failure_animation(state);
    decay_effects(state);
    update_cinematics(state, now, settings, &mut hooks);
    update_precision_bar(state, &mut hooks);

    if state.phase.is_sliding() {
        let friction_multiplier = slide_controls(state, precision_applied, settings, &mut hooks);
        integrate_slide(state, time_scale, friction_multiplier);

        if state.vel.x.abs() < SLIDE_REST_SPEED {
            resolve_rest(state, now, settings, &mut hooks);
        } else if state.pos.x >= CLIFF_EDGE {
            resolve_slide_off(state, now, settings, &mut hooks);
        }
    }

    update_near_miss_pause(state, now, settings);

    if settings.tutorials {
        if let Some(kind) = tutorial_trigger(state, prev_vy) {
            start_tutorial(state, kind, &mut hooks);
        }
    }

    if !state.pos.is_finite() || !state.vel.is_finite() {
        log::warn!(
            "Discarding non-finite motion (pos {:?}, vel {:?})",
            state.pos,
            state.vel
        );
        (state.pos, state.vel) = snapshot;
    }
}

/// Flying → Sliding when the thrower reaches the ground line
fn touch_down(state: &mut SessionState, settings: &Settings, hooks: &mut impl FrameHooks) {
    let ThrowPhase::Flying { launched_ms } = state.phase else {
        return;
    };
    let impact_speed = state.vel.y.abs();
    let Some(impact) = ground_contact(state) else {
        return;
    };

    state.phase = ThrowPhase::Sliding { launched_ms };
    impact_feedback(state, impact_speed, settings.reduce_fx);
    log::info!(
        "Ground contact at {:.2} (impact {:.2}, vx {:.3})",
        state.pos.x,
        impact,
        state.vel.x
    );
    hooks.play(SoundCue::Impact { intensity: impact });
    hooks.play(SoundCue::Slide);
    hooks.outcome(OutcomeEvent::GroundContact { impact });
}
