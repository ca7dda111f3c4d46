//! Cinematic time dilation
//!
//! Slow motion and zoom from edge proximity, the record zone and the
//! precision bar. The resulting scale feeds back into the integrator
//! through `effective_time_scale`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::decay::Decaying;
use super::events::FrameHooks;
use super::state::SessionState;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::inverse_lerp;
use crate::settings::Settings;

/// Edge effects start past this x
const EDGE_EFFECT_START: f64 = 90.0;
/// Edge effects need a best above this
const ESTABLISHED_BEST: f64 = 50.0;
/// Height factor is 0 above this y and ramps to 1 at the ground
const HEIGHT_SLOW_MO_Y: f64 = 180.0;
/// Finish-area zoom threshold
const CINEMATIC_THRESHOLD: f64 = 318.5;
/// Sliding past this x enters the Zeno ruler zone
const ZENO_RULER_START: f64 = CLIFF_EDGE - 1.0;

/// Record zone band around the best
const RECORD_ZONE_BEHIND: f64 = 30.0;
const RECORD_ZONE_AHEAD: f64 = 5.0;
/// Peak fires this close to the best while moving forward
const RECORD_PEAK_DISTANCE: f64 = 3.0;
/// Record zone intensity above this escalates to level two
const RECORD_ZONE_HIGH: f64 = 0.6;

/// Precision bar activation and zone
pub const PRECISION_TRIGGER_X: f64 = 409.9;
pub const PRECISION_ZONE_START: f64 = 410.0;
/// Precision time scale at the edge
const PRECISION_MIN_SCALE: f64 = 0.2;
/// PB pace turns on within this distance of the best
const PB_PACE_DISTANCE: f64 = 10.0;

/// Shake and flash on ground contact
const MAX_IMPACT_SHAKE: f64 = 8.0;
pub const LANDING_FRAMES: u32 = 8;

/// Approach to the personal best
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordZone {
    pub active: bool,
    /// 0 at the band edge, 1 at the best
    pub intensity: f64,
    /// Peak moment pending its cue
    pub peak: bool,
    /// Peak already fired this throw
    pub epic_triggered: bool,
}

/// Decimal-zone precision bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionBar {
    pub active: bool,
    pub time_scale: f64,
    pub triggered_this_throw: bool,
    pub pb_pace: bool,
    pub passed_pb: bool,
}

impl Default for PrecisionBar {
    fn default() -> Self {
        Self {
            active: false,
            time_scale: 1.0,
            triggered_this_throw: false,
            pb_pace: false,
            passed_pb: false,
        }
    }
}

/// Camera and time effects for the current throw
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cinematic {
    pub slow_mo: Decaying,
    pub zoom: Decaying,
    pub shake: Decaying,
    pub flash: Decaying,
    /// Camera zoom focus point
    pub focus: DVec2,
    /// 0..1 progress from x=90 to the edge, for the edge warning
    pub edge_proximity: f64,
    pub record_zone: RecordZone,
    pub precision: PrecisionBar,
    /// Charge power currently in the sweet spot
    pub sweet_spot: bool,
    /// Frames of landing squash remaining
    pub landing_frame: u32,
    /// Fall hit-stop already played this throw
    pub fail_juice_active: bool,
}

impl Default for Cinematic {
    fn default() -> Self {
        Self {
            slow_mo: Decaying::new(0.0, 0.95),
            zoom: Decaying::new(1.0, 0.92),
            shake: Decaying::new(0.0, 0.8),
            flash: Decaying::new(0.0, 0.85),
            focus: DVec2::new(LAUNCH_PAD_X, GROUND_Y),
            edge_proximity: 0.0,
            record_zone: RecordZone::default(),
            precision: PrecisionBar::default(),
            sweet_spot: false,
            landing_frame: 0,
            fail_juice_active: false,
        }
    }
}

/// 0 while high in the air, 1 near the ground. Always 1 while sliding.
pub fn height_factor(py: f64, sliding: bool) -> f64 {
    if sliding {
        return 1.0;
    }
    inverse_lerp(HEIGHT_SLOW_MO_Y, GROUND_Y, py)
}

/// Zeno ruler level from the fractional part past 419: .9 → 1, .99 → 2, ...
pub fn zeno_ruler_level(px: f64) -> u32 {
    let decimal = px - ZENO_RULER_START;
    [0.9, 0.99, 0.999, 0.9999]
        .iter()
        .filter(|threshold| decimal >= **threshold)
        .count() as u32
}

/// Digits to show for a position: more as it creeps toward the next unit
pub fn decimal_places(px: f64) -> u32 {
    if !px.is_finite() || px < PRECISION_ZONE_START {
        return 1;
    }
    let floor = px.floor();
    const THRESHOLDS: [(f64, u32); 7] = [
        (0.9999999, 8),
        (0.999999, 7),
        (0.99999, 6),
        (0.9999, 5),
        (0.999, 4),
        (0.99, 3),
        (0.9, 2),
    ];
    THRESHOLDS
        .iter()
        .find(|(threshold, _)| px >= floor + threshold)
        .map_or(1, |(_, places)| *places)
}

/// Precision slowdown before height scaling: 1.0 at 410, 0.2 at the edge
pub fn precision_time_scale(px: f64) -> f64 {
    let progress = inverse_lerp(PRECISION_ZONE_START, CLIFF_EDGE, px);
    1.0 - progress * (1.0 - PRECISION_MIN_SCALE)
}

/// Track the approach to the best and latch the peak once per throw
pub fn update_record_zone(state: &mut SessionState) {
    let zone = &mut state.cinematic.record_zone;
    if zone.epic_triggered || !state.phase.in_motion() {
        return;
    }
    let best = state.progress.best;
    let px = state.pos.x;
    let approaching = px > best - RECORD_ZONE_BEHIND && px < best + RECORD_ZONE_AHEAD;

    if approaching && best > ESTABLISHED_BEST && px > EDGE_EFFECT_START {
        zone.active = true;
        zone.intensity = (1.0 - (px - best).abs() / RECORD_ZONE_BEHIND).max(0.0);
        if px > best - RECORD_PEAK_DISTANCE && state.vel.x > 0.0 {
            zone.peak = true;
            zone.epic_triggered = true;
        }
    } else {
        zone.active = false;
        zone.intensity = 0.0;
    }
}

/// Target slow-mo and zoom for this frame, `None` when edge effects are off
fn cinematic_targets(state: &mut SessionState, slow_mo_enabled: bool, reduce_fx: bool) -> Option<(f64, f64)> {
    let px = state.pos.x;
    if !state.phase.in_motion() || px <= EDGE_EFFECT_START || state.progress.best <= ESTABLISHED_BEST {
        state.cinematic.edge_proximity = 0.0;
        return None;
    }

    let proximity = (px - EDGE_EFFECT_START) / (CLIFF_EDGE - EDGE_EFFECT_START);
    state.cinematic.edge_proximity = proximity.clamp(0.0, 1.0);
    let sliding = state.phase.is_sliding();
    let hf = height_factor(state.pos.y, sliding);
    let zone = state.cinematic.record_zone;

    let mut slow_mo = if slow_mo_enabled {
        (proximity * 0.8).min(0.7) * hf
    } else {
        0.0
    };
    let mut zoom = if reduce_fx { 1.0 } else { 1.0 + proximity * 0.3 };
    state.cinematic.focus = state.pos;

    if slow_mo_enabled {
        if zone.active {
            slow_mo = slow_mo.max(0.7 * hf);
            zoom = zoom.max(1.0 + 0.5 * hf);
            if zone.intensity > RECORD_ZONE_HIGH {
                slow_mo = (0.85 + zone.intensity * 0.1) * hf;
                zoom = 1.0 + (0.8 + zone.intensity * 0.5) * hf;
            }
        }
        if zone.peak {
            slow_mo = 0.98 * hf;
            zoom = 1.0 + 1.5 * hf;
        }
        if px > CINEMATIC_THRESHOLD {
            zoom = 1.0 + hf;
            slow_mo = 0.5 * hf;
            state.cinematic.focus = DVec2::new(CLIFF_EDGE - 30.0, WORLD_HEIGHT - 60.0);
        }
        if px > ZENO_RULER_START && sliding {
            let level = zeno_ruler_level(px) as f64;
            slow_mo = slow_mo.max(0.90 + level * 0.02);
            zoom = zoom.max(1.8);
        }
    }

    Some((slow_mo, zoom))
}

/// Recompute slow-mo and zoom, fire record-zone cues
pub fn update_cinematics(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    update_record_zone(state);

    let slow_mo_enabled = settings.slow_mo_enabled(state.progress.achievements.iter());
    if let Some((slow_mo, zoom)) = cinematic_targets(state, slow_mo_enabled, settings.reduce_fx) {
        state.cinematic.slow_mo.set(slow_mo);
        state.cinematic.zoom.set(zoom);

        let zone = state.cinematic.record_zone;
        if zone.active && slow_mo_enabled {
            let interval = if zone.intensity > RECORD_ZONE_HIGH { 300.0 } else { 400.0 };
            if crosses_interval(now_ms, interval) {
                hooks.play(SoundCue::Heartbeat {
                    intensity: zone.intensity,
                });
            }
        }

        if zone.peak {
            state.cinematic.record_zone.peak = false;
            log::info!("On pace to beat best {:.2}", state.progress.best);
            hooks.play(SoundCue::RecordBreak);
        }
    }
}

/// True on the first ~16ms frame of each `interval_ms` period
pub fn crosses_interval(now_ms: f64, interval_ms: f64) -> bool {
    (now_ms / interval_ms).floor() != ((now_ms - 16.0) / interval_ms).floor()
}

/// Activate, scale and release the precision bar
pub fn update_precision_bar(state: &mut SessionState, hooks: &mut impl FrameHooks) {
    let bar = &mut state.cinematic.precision;
    if !state.phase.in_motion() {
        bar.active = false;
        bar.time_scale = 1.0;
        return;
    }

    let px = state.pos.x;
    if px >= PRECISION_TRIGGER_X && !bar.active && px <= CLIFF_EDGE {
        bar.active = true;
        bar.triggered_this_throw = true;
        log::debug!("Precision bar active at {:.4}", px);
    }

    if bar.active && (PRECISION_ZONE_START..=CLIFF_EDGE).contains(&px) {
        let hf = height_factor(state.pos.y, state.phase.is_sliding());
        bar.time_scale = 1.0 - (1.0 - precision_time_scale(px)) * hf;
    }

    if px > CLIFF_EDGE && bar.active {
        bar.active = false;
        bar.time_scale = 1.0;
    }

    let best = state.progress.best;
    if !bar.pb_pace && best > 0.0 && px > best - PB_PACE_DISTANCE {
        bar.pb_pace = true;
    }
    if bar.active && !bar.passed_pb && best >= PRECISION_ZONE_START && px > best {
        bar.passed_pb = true;
        hooks.play(SoundCue::PbDing);
    }
}

/// Ground contact feedback
pub fn impact_feedback(state: &mut SessionState, impact_speed: f64, reduce_fx: bool) {
    if !reduce_fx {
        state
            .cinematic
            .shake
            .set((2.0 + impact_speed * 1.5).min(MAX_IMPACT_SHAKE));
    }
    state.cinematic.landing_frame = LANDING_FRAMES;
}

/// Relax every decaying effect one frame
pub fn decay_effects(state: &mut SessionState) {
    let cinematic = &mut state.cinematic;
    cinematic.shake.step();
    cinematic.flash.step();
    cinematic.slow_mo.step();
    cinematic.zoom.step();
    cinematic.landing_frame = cinematic.landing_frame.saturating_sub(1);
    state.tick_denied_shake();
}

/// Time scale for the integrator this frame
pub fn effective_time_scale(state: &SessionState, tutorial_multiplier: f64) -> f64 {
    let precision = if state.cinematic.precision.active {
        state.cinematic.precision.time_scale
    } else {
        1.0
    };
    TIME_SCALE * (1.0 - state.cinematic.slow_mo.get()) * tutorial_multiplier * precision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::RecordingHooks;
    use crate::sim::state::{Progress, ThrowPhase};

    fn moving(px: f64, best: f64) -> SessionState {
        let progress = Progress {
            best,
            ..Default::default()
        };
        let mut state = SessionState::new(2, progress);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.pos = DVec2::new(px, GROUND_Y);
        state.vel = DVec2::new(1.0, 0.0);
        state
    }

    #[test]
    fn test_height_factor() {
        assert_eq!(height_factor(100.0, false), 0.0);
        assert_eq!(height_factor(200.0, false), 0.5);
        assert_eq!(height_factor(GROUND_Y, false), 1.0);
        assert_eq!(height_factor(0.0, true), 1.0);
    }

    #[test]
    fn test_edge_slow_mo_needs_established_best() {
        let settings = Settings::default();
        let mut hooks = RecordingHooks::default();

        let mut fresh = moving(250.0, 0.0);
        update_cinematics(&mut fresh, 0.0, &settings, &mut hooks);
        assert_eq!(fresh.cinematic.slow_mo.get(), 0.0);

        let mut state = moving(250.0, 100.0);
        update_cinematics(&mut state, 0.0, &settings, &mut hooks);
        let proximity: f64 = (250.0 - 90.0) / (420.0 - 90.0);
        assert!((state.cinematic.slow_mo.get() - (proximity * 0.8).min(0.7)).abs() < 1e-12);
        assert!((state.cinematic.zoom.get() - (1.0 + proximity * 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_reduce_fx_disables_slow_mo() {
        let settings = Settings {
            reduce_fx: true,
            ..Default::default()
        };
        let mut hooks = RecordingHooks::default();
        let mut state = moving(300.0, 310.0);
        update_cinematics(&mut state, 0.0, &settings, &mut hooks);
        assert_eq!(state.cinematic.slow_mo.get(), 0.0);
        assert_eq!(state.cinematic.zoom.get(), 1.0);
    }

    #[test]
    fn test_record_peak_fires_once() {
        let settings = Settings::default();
        let mut hooks = RecordingHooks::default();
        let mut state = moving(200.0, 200.0);
        for step in 0..10 {
            state.pos.x = 198.0 + step as f64 * 0.5;
            update_cinematics(&mut state, step as f64 * 16.0, &settings, &mut hooks);
        }
        assert_eq!(hooks.count(SoundCue::RecordBreak), 1);
        assert!(state.cinematic.record_zone.epic_triggered);
    }

    #[test]
    fn test_no_record_fanfare_before_edge_effects() {
        let settings = Settings::default();
        let mut hooks = RecordingHooks::default();
        let mut state = moving(60.0, 70.0);
        for step in 0..12 {
            state.pos.x = 60.0 + step as f64;
            update_cinematics(&mut state, step as f64 * 16.0, &settings, &mut hooks);
        }
        assert!(!hooks.played(SoundCue::RecordBreak));
        assert!(!state.cinematic.record_zone.active);
        assert!(!state.cinematic.record_zone.epic_triggered);
    }

    #[test]
    fn test_record_zone_intensity_escalates() {
        let settings = Settings::default();
        let mut hooks = RecordingHooks::default();
        let mut state = moving(280.0, 300.0);
        state.pos.y = 150.0;
        state.phase = ThrowPhase::Flying { launched_ms: 0.0 };
        update_cinematics(&mut state, 0.0, &settings, &mut hooks);
        let zone = state.cinematic.record_zone;
        assert!(zone.active);
        assert!((zone.intensity - (1.0 - 20.0 / 30.0)).abs() < 1e-12);
        // High in the air: height factor 0 keeps slow-mo off
        assert_eq!(state.cinematic.slow_mo.get(), 0.0);
    }

    #[test]
    fn test_zeno_ruler_levels() {
        assert_eq!(zeno_ruler_level(419.5), 0);
        assert_eq!(zeno_ruler_level(419.95), 1);
        assert_eq!(zeno_ruler_level(419.995), 2);
        assert_eq!(zeno_ruler_level(419.9995), 3);
        assert_eq!(zeno_ruler_level(419.99995), 4);
    }

    #[test]
    fn test_zeno_ruler_slow_mo_while_sliding() {
        let settings = Settings::default();
        let mut hooks = RecordingHooks::default();
        let mut state = moving(419.995, 100.0);
        update_cinematics(&mut state, 0.0, &settings, &mut hooks);
        assert!((state.cinematic.slow_mo.get() - 0.94).abs() < 1e-12);
        assert!(state.cinematic.zoom.get() >= 1.8);
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(300.95), 1);
        assert_eq!(decimal_places(415.5), 1);
        assert_eq!(decimal_places(415.95), 2);
        assert_eq!(decimal_places(419.9995), 4);
        assert_eq!(decimal_places(419.99999999), 8);
    }

    #[test]
    fn test_precision_bar_scale() {
        let mut hooks = RecordingHooks::default();
        let mut state = moving(415.0, 0.0);
        update_precision_bar(&mut state, &mut hooks);
        assert!(state.cinematic.precision.active);
        assert!((state.cinematic.precision.time_scale - 0.6).abs() < 1e-12);
        assert!((precision_time_scale(CLIFF_EDGE) - 0.2).abs() < 1e-12);
        assert_eq!(precision_time_scale(400.0), 1.0);

        state.pos.x = 421.0;
        update_precision_bar(&mut state, &mut hooks);
        assert!(!state.cinematic.precision.active);
        assert_eq!(state.cinematic.precision.time_scale, 1.0);
    }

    #[test]
    fn test_pb_ding_in_precision_zone() {
        let mut hooks = RecordingHooks::default();
        let mut state = moving(412.0, 412.5);
        update_precision_bar(&mut state, &mut hooks);
        assert!(state.cinematic.precision.pb_pace);
        assert!(!hooks.played(SoundCue::PbDing));
        state.pos.x = 413.0;
        update_precision_bar(&mut state, &mut hooks);
        state.pos.x = 413.5;
        update_precision_bar(&mut state, &mut hooks);
        assert_eq!(hooks.count(SoundCue::PbDing), 1);
    }

    #[test]
    fn test_effective_time_scale_combines() {
        let mut state = moving(415.0, 0.0);
        state.cinematic.slow_mo.set(0.5);
        state.cinematic.precision.active = true;
        state.cinematic.precision.time_scale = 0.5;
        let scale = effective_time_scale(&state, 0.1);
        assert!((scale - TIME_SCALE * 0.5 * 0.1 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_effects_decay() {
        let mut state = moving(100.0, 0.0);
        state.cinematic.shake.set(5.0);
        state.cinematic.slow_mo.set(0.9);
        state.cinematic.landing_frame = 2;
        state.stamina_denied_shake = 1;
        decay_effects(&mut state);
        assert!((state.cinematic.shake.get() - 4.0).abs() < 1e-12);
        assert!((state.cinematic.slow_mo.get() - 0.855).abs() < 1e-12);
        assert_eq!(state.cinematic.landing_frame, 1);
        assert_eq!(state.stamina_denied_shake, 0);
    }
}
