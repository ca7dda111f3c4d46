//! First-time tutorials
//!
//! Each control gets a short slowed-down prompt the first time it becomes
//! usable: charging, the flight apex, and the first sliding frame.

use serde::{Deserialize, Serialize};

use super::events::{FrameHooks, OutcomeEvent};
use super::state::{SessionState, TutorialSeen};
use crate::audio::SoundCue;

/// Seconds each prompt stays up
pub const TUTORIAL_DURATION: f64 = 2.0;
/// Time multiplier while a prompt is up
pub const TUTORIAL_SLOW_MO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorialKind {
    Charge,
    Air,
    Slide,
}

impl TutorialKind {
    /// Prompt text for the overlay
    pub fn lines(&self) -> &'static [&'static str] {
        match self {
            TutorialKind::Charge => &["Hold to charge power (it bounces!)", "Drag up/down to aim"],
            TutorialKind::Air => &["TAP = float longer", "HOLD = brake"],
            TutorialKind::Slide => &["TAP = push further", "HOLD = brake"],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorialState {
    /// Prompt on screen and seconds left
    pub active: Option<(TutorialKind, f64)>,
    pub seen: TutorialSeen,
}

impl TutorialState {
    pub fn new(seen: TutorialSeen) -> Self {
        Self { active: None, seen }
    }

    pub fn has_seen(&self, kind: TutorialKind) -> bool {
        match kind {
            TutorialKind::Charge => self.seen.charge,
            TutorialKind::Air => self.seen.air,
            TutorialKind::Slide => self.seen.slide,
        }
    }

    fn mark_seen(&mut self, kind: TutorialKind) {
        match kind {
            TutorialKind::Charge => self.seen.charge = true,
            TutorialKind::Air => self.seen.air = true,
            TutorialKind::Slide => self.seen.slide = true,
        }
    }

    /// Show the prompts again from the start
    pub fn reset_progress(&mut self) {
        self.active = None;
        self.seen = TutorialSeen::default();
    }
}

/// Advance the active prompt by `dt` seconds. Returns the time multiplier.
pub fn update_tutorial(state: &mut SessionState, dt: f64) -> f64 {
    let Some((kind, remaining)) = state.tutorial.active else {
        return 1.0;
    };
    let remaining = remaining - dt;
    if remaining <= 0.0 {
        state.tutorial.active = None;
        state.tutorial.mark_seen(kind);
        state.progress.tutorial_seen = state.tutorial.seen;
        log::debug!("Tutorial {:?} complete", kind);
        return 1.0;
    }
    state.tutorial.active = Some((kind, remaining));
    TUTORIAL_SLOW_MO
}

/// Which prompt this frame calls for, if any
pub fn tutorial_trigger(state: &SessionState, prev_vy: f64) -> Option<TutorialKind> {
    if state.tutorial.active.is_some() {
        return None;
    }
    let tutorial = &state.tutorial;
    if state.phase.is_charging() && !tutorial.has_seen(TutorialKind::Charge) {
        return Some(TutorialKind::Charge);
    }
    if state.phase.is_flying()
        && !tutorial.has_seen(TutorialKind::Air)
        && prev_vy < 0.0
        && state.vel.y >= 0.0
    {
        return Some(TutorialKind::Air);
    }
    if state.phase.is_sliding() && !tutorial.has_seen(TutorialKind::Slide) && state.vel.x != 0.0 {
        return Some(TutorialKind::Slide);
    }
    None
}

pub fn start_tutorial(state: &mut SessionState, kind: TutorialKind, hooks: &mut impl FrameHooks) {
    state.tutorial.active = Some((kind, TUTORIAL_DURATION));
    log::info!("Tutorial: {}", kind.lines().join(" / "));
    hooks.play(SoundCue::TutorialPrompt);
    hooks.outcome(OutcomeEvent::TutorialShown(kind));
}
