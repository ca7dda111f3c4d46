//! Landing resolution and scoring
//!
//! A slide ends one of two ways: at rest before the edge (scored, may
//! advance the Zeno target) or over it (a fall with its failure animation).
//! Either way the throw is latched as `Resolved` and a reset is scheduled.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{FrameHooks, OutcomeEvent};
use super::state::{
    DailyStats, FailureKind, Progress, SessionState, ThrowOutcome, ThrowPhase,
};
use crate::audio::{SoundCue, haptics};
use crate::consts::*;
use crate::leaderboard::LeaderboardEntry;
use crate::round_distance;
use crate::settings::Settings;

/// Consecutive landings at or beyond this build the hot streak
pub const HOT_STREAK_DISTANCE: f64 = 419.0;

pub const NEAR_MISS_PAUSE_MS: f64 = 1000.0;
const NEAR_MISS_SLOW_MO: f64 = 0.9;
const NEAR_MISS_HOLD_SLOW_MO: f64 = 0.85;
const NEAR_MISS_FLASH: f64 = 0.1;

const FAIL_HIT_STOP: f64 = 0.95;
const FAIL_SHAKE: f64 = 5.0;
const WILHELM_CHANCE: f64 = 0.1;
/// Sliding off faster than this dives instead of tumbling
const DIVE_SPEED: f64 = 2.0;
const LEVEL_UP_FLASH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NearMissIntensity {
    Extreme,
    Close,
    Near,
}

impl NearMissIntensity {
    /// Classify a fall by how far past the edge it went and how far it was
    /// from the target
    pub fn classify(past_edge: f64, from_target: f64) -> Option<Self> {
        if past_edge < 0.5 || from_target < 2.0 {
            Some(NearMissIntensity::Extreme)
        } else if past_edge < 2.0 || from_target < 5.0 {
            Some(NearMissIntensity::Close)
        } else if past_edge < 5.0 || from_target < 10.0 {
            Some(NearMissIntensity::Near)
        } else {
            None
        }
    }

    fn heartbeat(&self) -> Option<f64> {
        match self {
            NearMissIntensity::Extreme => Some(1.0),
            NearMissIntensity::Close => Some(0.7),
            NearMissIntensity::Near => None,
        }
    }
}

/// Dramatic pause after sliding off just short of glory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearMiss {
    pub intensity: NearMissIntensity,
    pub distance: f64,
    pub started_ms: f64,
    /// Pause still running
    pub active: bool,
}

/// Comedic fall off the edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureAnimation {
    pub kind: FailureKind,
    pub frame: u32,
    pub finished: bool,
}

/// Result of applying a landing to the Zeno progression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZenoAdvance {
    /// Reached the target; level incremented and target re-centered
    LevelUp,
    /// Beat the best without reaching the target
    NewBest,
    Unchanged,
}

/// Landing distance at full precision
pub fn landing_distance(px: f64) -> f64 {
    round_distance(px)
}

pub fn is_perfect(distance: f64, zeno_target: f64) -> bool {
    (distance - zeno_target).abs() < PERFECT_WINDOW
}

/// Final multiplier and score for a landing
pub fn landing_score(distance: f64, ring_multiplier: f64, perfect: bool) -> (f64, f64) {
    let multiplier = ring_multiplier.min(MAX_FINAL_MULTIPLIER);
    let bonus = if perfect { PERFECT_BONUS } else { 0.0 };
    (multiplier, distance * multiplier + bonus)
}

/// Move best and target for a landing at `distance`
pub fn advance_zeno(progress: &mut Progress, distance: f64, run_trail: &[DVec2]) -> ZenoAdvance {
    let advance = if distance >= progress.zeno_target {
        progress.zeno_level += 1;
        progress.best = distance;
        progress.zeno_target = (distance + CLIFF_EDGE) / 2.0;
        ZenoAdvance::LevelUp
    } else if distance > progress.best {
        progress.best = distance;
        ZenoAdvance::NewBest
    } else {
        return ZenoAdvance::Unchanged;
    };

    if !run_trail.is_empty() {
        progress.best_trail = run_trail.iter().take(BEST_TRAIL_LENGTH).copied().collect();
    }
    advance
}

/// Came to rest while sliding. Scores the landing or, if rounding puts it
/// on the edge, turns it into a fall.
pub fn resolve_rest(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let launched_ms = state.phase.launched_ms().unwrap_or(now_ms);
    state.vel.x = 0.0;
    let landed_at = landing_distance(state.pos.x);

    if landed_at >= CLIFF_EDGE {
        let kind = if state.rng.random_bool(0.5) {
            FailureKind::Tumble
        } else {
            FailureKind::Dive
        };
        fall_off(state, kind, now_ms, settings, hooks);
    } else {
        land(state, landed_at, launched_ms, now_ms, settings, hooks);
    }
    finish_throw(state, hooks);
}

/// Slid past the edge while still moving
pub fn resolve_slide_off(
    state: &mut SessionState,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let kind = if state.vel.x > DIVE_SPEED {
        FailureKind::Dive
    } else {
        FailureKind::Tumble
    };
    fall_off(state, kind, now_ms, settings, hooks);
    finish_throw(state, hooks);
}

fn land(
    state: &mut SessionState,
    distance: f64,
    launched_ms: f64,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    let perfect = is_perfect(distance, state.progress.zeno_target);
    let (multiplier, score) = landing_score(distance, state.ring_multiplier, perfect);

    state.dist = distance.max(0.0);
    state.fell_off = false;
    state.last_multiplier = multiplier;
    state.current_multiplier = multiplier;
    state.perfect_landing = perfect;
    state.phase = ThrowPhase::Resolved(ThrowOutcome::Landed {
        distance: state.dist,
        perfect,
        multiplier,
    });

    log::info!(
        "Landed at {:.8} (x{:.3}, +{:.1}{})",
        state.dist,
        multiplier,
        score,
        if perfect { ", perfect" } else { "" }
    );
    hooks.play(SoundCue::Land);
    if perfect {
        hooks.play(SoundCue::Perfect);
    }
    if settings.haptics {
        hooks.haptic(if perfect { haptics::PERFECT } else { haptics::LAND });
    }
    hooks.outcome(OutcomeEvent::Landed {
        distance: state.dist,
        multiplier,
        score_gained: score,
        perfect,
    });

    if state.practice_mode {
        log::debug!("Practice throw, score not recorded");
        return;
    }

    let rings = state.rings_passed_this_throw;
    let stats = &mut state.progress.stats;
    stats.total_rings_passed += rings;
    stats.max_rings_in_throw = stats.max_rings_in_throw.max(rings);
    if rings == 3 {
        stats.perfect_ring_throws += 1;
    }
    log::debug!(
        "Scoring: base {:.8} rings {} multiplier {:.3} gained {:.1}",
        distance,
        rings,
        state.ring_multiplier,
        score
    );

    state.progress.total_score += score;
    hooks.outcome(OutcomeEvent::TotalScore(state.progress.total_score));

    let daily = hooks.daily_stats();
    let daily = DailyStats {
        best_distance: daily.best_distance.max(state.dist),
        best_score: daily.best_score.max(state.progress.total_score),
    };
    hooks.outcome(OutcomeEvent::DailyStats(daily));

    match advance_zeno(&mut state.progress, state.dist, &state.run_trail) {
        ZenoAdvance::LevelUp => {
            let progress = &state.progress;
            log::info!(
                "Zeno level {}: best {:.8}, next target {:.8}",
                progress.zeno_level,
                progress.best,
                progress.zeno_target
            );
            if !settings.reduce_fx {
                state.cinematic.flash.set(LEVEL_UP_FLASH);
            }
            hooks.play(SoundCue::LevelUp);
            if settings.haptics {
                hooks.haptic(haptics::LEVEL_UP);
            }
            hooks.outcome(OutcomeEvent::LevelUp {
                level: progress.zeno_level,
                best: progress.best,
                target: progress.zeno_target,
            });
        }
        ZenoAdvance::NewBest => {
            log::info!("New best {:.8}", state.progress.best);
            hooks.outcome(OutcomeEvent::NewBest {
                best: state.progress.best,
            });
        }
        ZenoAdvance::Unchanged => {}
    }

    let stats = &mut state.progress.stats;
    stats.successful_landings += 1;
    stats.total_distance += state.dist;
    if perfect {
        stats.perfect_landings += 1;
    }
    stats.max_multiplier = stats.max_multiplier.max(multiplier);
    stats.max_air_time = stats.max_air_time.max((now_ms - launched_ms) / 1000.0);
    state.landings_without_fall += 1;

    let entry = LeaderboardEntry {
        distance: state.dist,
        score,
        level: state.progress.zeno_level,
        timestamp: now_ms,
    };
    if let Some(rank) = state.progress.leaderboard.add(entry) {
        hooks.outcome(OutcomeEvent::LeaderboardRank(rank));
    }
}

fn fall_off(
    state: &mut SessionState,
    kind: FailureKind,
    now_ms: f64,
    settings: &Settings,
    hooks: &mut impl FrameHooks,
) {
    state.fell_off = true;
    state.dist = 0.0;
    state.last_multiplier = 0.0;
    state.perfect_landing = false;
    state.phase = ThrowPhase::Resolved(ThrowOutcome::FellOff { failure: kind });
    state.failure = Some(FailureAnimation {
        kind,
        frame: 0,
        finished: false,
    });

    fail_juice(state, settings, hooks);
    let near_miss = detect_near_miss(state, now_ms);

    log::info!(
        "Fell off at {:.4} ({:?}, last valid {:.4})",
        state.pos.x,
        kind,
        state.last_valid_px
    );
    if state.rng.random_bool(WILHELM_CHANCE) {
        hooks.play(SoundCue::WilhelmScream);
    } else {
        hooks.play(SoundCue::Fall);
    }
    if let Some(heartbeat) = near_miss.and_then(|n| n.heartbeat()) {
        hooks.play(SoundCue::Heartbeat {
            intensity: heartbeat,
        });
    }
    hooks.outcome(OutcomeEvent::FellOff {
        last_valid_px: state.last_valid_px,
        near_miss,
    });

    if !state.practice_mode {
        state.progress.total_falls += 1;
        state.landings_without_fall = 0;
    }
}

/// Hit-stop, shake and impact on falling. Once per throw.
fn fail_juice(state: &mut SessionState, settings: &Settings, hooks: &mut impl FrameHooks) {
    if state.cinematic.fail_juice_active {
        return;
    }
    state.cinematic.fail_juice_active = true;
    state.cinematic.slow_mo.at_least(FAIL_HIT_STOP);
    state
        .cinematic
        .shake
        .set(if settings.reduce_fx { 0.0 } else { FAIL_SHAKE });
    hooks.play(SoundCue::FailImpact);
    if settings.haptics {
        hooks.haptic(haptics::FAIL);
    }
}

fn detect_near_miss(state: &mut SessionState, now_ms: f64) -> Option<NearMissIntensity> {
    if state.near_miss.is_some_and(|n| n.active) {
        return None;
    }
    let past_edge = (state.pos.x - CLIFF_EDGE).abs();
    let from_target = (state.pos.x - state.progress.zeno_target).abs();
    let intensity = NearMissIntensity::classify(past_edge, from_target)?;

    state.near_miss = Some(NearMiss {
        intensity,
        distance: past_edge.min(from_target),
        started_ms: now_ms,
        active: true,
    });
    state.cinematic.slow_mo.set(NEAR_MISS_SLOW_MO);
    Some(intensity)
}

/// Bookkeeping shared by every resolved throw, then the landed latch
fn finish_throw(state: &mut SessionState, hooks: &mut impl FrameHooks) {
    if !state.practice_mode {
        state.progress.stats.total_throws += 1;

        if !state.fell_off && state.dist >= HOT_STREAK_DISTANCE {
            state.hot_streak += 1;
        } else {
            state.hot_streak = 0;
        }
        state.progress.best_hot_streak = state.progress.best_hot_streak.max(state.hot_streak);
        hooks.outcome(OutcomeEvent::HotStreak {
            current: state.hot_streak,
            best: state.progress.best_hot_streak,
        });
        hooks.outcome(OutcomeEvent::Stats(state.progress.stats.clone()));
        hooks.outcome(OutcomeEvent::AchievementCheck);

        state.last_dist = if state.fell_off { None } else { Some(state.dist) };
    }

    state.try_count += 1;
    if state.try_count % 5 == 0 {
        state.next_wind();
    }
    hooks.schedule_reset(if state.fell_off {
        FALL_RESET_MS
    } else {
        LANDING_RESET_MS
    });
}

/// Hold the dramatic pause and pulse the screen with the heartbeat
pub fn update_near_miss_pause(state: &mut SessionState, now_ms: f64, settings: &Settings) {
    let Some(near_miss) = state.near_miss.as_mut() else {
        return;
    };
    if !near_miss.active {
        return;
    }
    let elapsed = now_ms - near_miss.started_ms;
    if elapsed >= NEAR_MISS_PAUSE_MS {
        near_miss.active = false;
        return;
    }
    state.cinematic.slow_mo.at_least(NEAR_MISS_HOLD_SLOW_MO);
    let pulse = elapsed < 200.0 || (elapsed > 400.0 && elapsed < 600.0);
    if pulse && !settings.reduce_fx {
        state.cinematic.flash.set(NEAR_MISS_FLASH);
    }
}

/// Advance the fall until the thrower leaves the screen
pub fn update_failure_animation(state: &mut SessionState) {
    let Some(failure) = state.failure.as_mut() else {
        return;
    };
    if failure.finished {
        return;
    }
    failure.frame += 1;
    let frame = failure.frame as f64;
    match failure.kind {
        FailureKind::Tumble => {
            state.pos.x += 1.0;
            state.pos.y += frame * 0.5;
        }
        FailureKind::Dive => {
            state.pos.x += 2.0;
            state.pos.y += frame * 0.8;
        }
    }
    if state.pos.y > WORLD_HEIGHT + 50.0 {
        failure.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::RecordingHooks;
    use proptest::prelude::*;

    fn sliding_at(px: f64, progress: Progress) -> SessionState {
        let mut state = SessionState::new(11, progress);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        state.pos = DVec2::new(px, GROUND_Y);
        state.vel = DVec2::new(0.05, 0.0);
        state
    }

    #[test]
    fn test_perfect_window() {
        assert!(is_perfect(210.3, 210.0));
        assert!(!is_perfect(210.5, 210.0));
    }

    #[test]
    fn test_score_caps_multiplier() {
        assert_eq!(landing_score(100.0, 1.375, false), (1.375, 137.5));
        assert_eq!(landing_score(100.0, 9.0, true), (5.0, 510.0));
    }

    #[test]
    fn test_landing_scores_and_levels_up() {
        let mut state = sliding_at(300.0, Progress::default());
        let mut hooks = RecordingHooks::default();
        resolve_rest(&mut state, 2500.0, &Settings::default(), &mut hooks);

        assert!(matches!(
            state.phase,
            ThrowPhase::Resolved(ThrowOutcome::Landed { distance, .. }) if distance == 300.0
        ));
        assert_eq!(state.progress.best, 300.0);
        assert_eq!(state.progress.zeno_level, 1);
        assert_eq!(state.progress.zeno_target, 360.0);
        assert_eq!(state.progress.total_score, 300.0);
        assert_eq!(state.progress.stats.successful_landings, 1);
        assert_eq!(state.progress.stats.total_throws, 1);
        assert_eq!(state.progress.stats.max_air_time, 2.5);
        assert_eq!(state.last_dist, Some(300.0));
        assert_eq!(state.try_count, 1);
        assert_eq!(hooks.resets, vec![LANDING_RESET_MS]);
        assert!(hooks.played(SoundCue::LevelUp));
        assert!(hooks.find(|e| *e == OutcomeEvent::AchievementCheck).is_some());
        assert_eq!(hooks.daily.best_distance, 300.0);
        assert_eq!(state.progress.leaderboard.top_distance(), Some(300.0));
    }

    #[test]
    fn test_rest_just_short_of_edge_keeps_precision() {
        let progress = Progress {
            best: 419.9,
            zeno_target: 419.95,
            ..Default::default()
        };
        let mut state = sliding_at(419.999999, progress);
        let mut hooks = RecordingHooks::default();
        resolve_rest(&mut state, 1000.0, &Settings::default(), &mut hooks);

        assert!(!state.fell_off);
        assert_eq!(state.dist, 419.999999);
        assert_eq!(state.progress.best, 419.999999);
        assert_eq!(state.progress.zeno_level, 1);
        assert!(state.progress.zeno_target > state.progress.best);
        assert!(state.progress.zeno_target < CLIFF_EDGE);
        assert_eq!(state.hot_streak, 1);
    }

    #[test]
    fn test_new_best_below_target() {
        let progress = Progress {
            best: 200.0,
            zeno_target: 310.0,
            ..Default::default()
        };
        let mut state = sliding_at(250.0, progress);
        let mut hooks = RecordingHooks::default();
        resolve_rest(&mut state, 0.0, &Settings::default(), &mut hooks);
        assert_eq!(state.progress.best, 250.0);
        assert_eq!(state.progress.zeno_level, 0);
        assert_eq!(state.progress.zeno_target, 310.0);
        assert!(hooks.find(|e| matches!(e, OutcomeEvent::NewBest { .. })).is_some());
    }

    #[test]
    fn test_practice_landing_records_nothing() {
        let mut state = sliding_at(300.0, Progress::default());
        state.practice_mode = true;
        let mut hooks = RecordingHooks::practice();
        resolve_rest(&mut state, 0.0, &Settings::default(), &mut hooks);

        assert_eq!(state.progress, Progress::default());
        assert_eq!(state.last_dist, None);
        assert!(hooks.find(|e| matches!(e, OutcomeEvent::Landed { .. })).is_some());
        assert!(hooks.find(|e| *e == OutcomeEvent::AchievementCheck).is_none());
        assert_eq!(hooks.resets, vec![LANDING_RESET_MS]);
    }

    #[test]
    fn test_rounding_onto_edge_is_a_fall() {
        let mut state = sliding_at(419.999999999, Progress::default());
        let mut hooks = RecordingHooks::default();
        resolve_rest(&mut state, 0.0, &Settings::default(), &mut hooks);
        assert!(state.fell_off);
        assert_eq!(state.dist, 0.0);
        assert_eq!(state.progress.total_falls, 1);
        assert_eq!(hooks.resets, vec![FALL_RESET_MS]);
    }

    #[test]
    fn test_slide_off_near_miss() {
        let mut state = sliding_at(420.3, Progress::default());
        state.vel.x = 3.0;
        state.landings_without_fall = 4;
        let mut hooks = RecordingHooks::default();
        resolve_slide_off(&mut state, 500.0, &Settings::default(), &mut hooks);

        assert!(matches!(
            state.phase,
            ThrowPhase::Resolved(ThrowOutcome::FellOff {
                failure: FailureKind::Dive
            })
        ));
        assert_eq!(state.landings_without_fall, 0);
        assert_eq!(state.hot_streak, 0);
        assert_eq!(
            state.near_miss.map(|n| n.intensity),
            Some(NearMissIntensity::Extreme)
        );
        assert!(hooks.played(SoundCue::FailImpact));
        assert!(hooks.played(SoundCue::Heartbeat { intensity: 1.0 }));
        assert!(state.cinematic.shake.get() == FAIL_SHAKE);

        update_near_miss_pause(&mut state, 600.0, &Settings::default());
        assert!(state.cinematic.slow_mo.get() >= NEAR_MISS_HOLD_SLOW_MO);
        assert_eq!(state.cinematic.flash.get(), NEAR_MISS_FLASH);
        update_near_miss_pause(&mut state, 1600.0, &Settings::default());
        assert!(state.near_miss.is_some_and(|n| !n.active));
    }

    #[test]
    fn test_near_miss_classification() {
        assert_eq!(NearMissIntensity::classify(0.2, 50.0), Some(NearMissIntensity::Extreme));
        assert_eq!(NearMissIntensity::classify(1.0, 50.0), Some(NearMissIntensity::Close));
        assert_eq!(NearMissIntensity::classify(8.0, 7.0), Some(NearMissIntensity::Near));
        assert_eq!(NearMissIntensity::classify(8.0, 50.0), None);
    }

    #[test]
    fn test_failure_animation_leaves_screen() {
        let mut state = sliding_at(420.5, Progress::default());
        state.failure = Some(FailureAnimation {
            kind: FailureKind::Tumble,
            frame: 0,
            finished: false,
        });
        let mut frames = 0;
        while state.failure.is_some_and(|f| !f.finished) {
            update_failure_animation(&mut state);
            frames += 1;
            assert!(frames < 100);
        }
        assert!(state.pos.y > WORLD_HEIGHT + 50.0);
        assert!(state.pos.x > 420.5);
    }

    #[test]
    fn test_wind_changes_every_fifth_try() {
        let mut state = sliding_at(100.0, Progress::default());
        let initial = state.wind;
        let mut hooks = RecordingHooks::default();
        for _ in 0..4 {
            state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
            resolve_rest(&mut state, 0.0, &Settings::default(), &mut hooks);
        }
        assert_eq!(state.wind, initial);
        state.phase = ThrowPhase::Sliding { launched_ms: 0.0 };
        resolve_rest(&mut state, 0.0, &Settings::default(), &mut hooks);
        assert_eq!(state.try_count, 5);
        assert_eq!(state.wind, -0.05);
    }

    proptest! {
        #[test]
        fn zeno_progression_from_zero(distance in 0.0f64..419.9999) {
            let mut progress = Progress::default();
            let target = progress.zeno_target;
            let advance = advance_zeno(&mut progress, distance, &[]);
            if distance >= target {
                prop_assert_eq!(advance, ZenoAdvance::LevelUp);
                prop_assert_eq!(progress.zeno_level, 1);
                prop_assert_eq!(progress.zeno_target, (distance + CLIFF_EDGE) / 2.0);
                prop_assert!(progress.zeno_target > progress.best);
                prop_assert!(progress.zeno_target < CLIFF_EDGE);
            } else if distance > 0.0 {
                prop_assert_eq!(advance, ZenoAdvance::NewBest);
                prop_assert_eq!(progress.best, distance);
                prop_assert_eq!(progress.zeno_level, 0);
            }
        }
    }
}
