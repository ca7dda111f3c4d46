//! Collaborator interface
//!
//! `tick` reports everything it does through `FrameHooks`. Apart from
//! `consume_throw` (which decides practice mode) the core never looks at
//! what the host does with a notification.

use serde::{Deserialize, Serialize};

use super::landing::NearMissIntensity;
use super::state::{DailyStats, Stats};
use super::tutorial::TutorialKind;
use crate::audio::SoundCue;
use crate::throws::ThrowGrant;

/// Outcome notifications for persistence, achievements and UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutcomeEvent {
    /// A throw left the pad
    Launched { grant: ThrowGrant },
    RingCollected { index: u8, ring_multiplier: f64 },
    GroundContact { impact: f64 },
    /// Came to rest before the edge
    Landed {
        distance: f64,
        multiplier: f64,
        score_gained: f64,
        perfect: bool,
    },
    /// Best improved without reaching the target
    NewBest { best: f64 },
    /// Reached the Zeno target
    LevelUp { level: u32, best: f64, target: f64 },
    FellOff {
        last_valid_px: f64,
        near_miss: Option<NearMissIntensity>,
    },
    TotalScore(f64),
    Stats(Stats),
    DailyStats(DailyStats),
    HotStreak { current: u32, best: u32 },
    /// New leaderboard entry, 0-based rank
    LeaderboardRank(usize),
    TutorialShown(TutorialKind),
    /// Throw resolved; check achievement conditions now
    AchievementCheck,
}

/// Callbacks the host provides for one frame
pub trait FrameHooks {
    fn play(&mut self, cue: SoundCue);

    fn outcome(&mut self, event: OutcomeEvent);

    fn haptic(&mut self, _pattern: &[u32]) {}

    /// Ask the host to call `SessionState::reset_throw` after `delay_ms`
    fn schedule_reset(&mut self, delay_ms: u32);

    fn daily_stats(&self) -> DailyStats {
        DailyStats::default()
    }

    /// Pay for a throw at launch
    fn consume_throw(&mut self) -> ThrowGrant;
}

/// Hooks that record everything, for tests and headless runs
#[derive(Debug, Clone)]
pub struct RecordingHooks {
    pub cues: Vec<SoundCue>,
    pub events: Vec<OutcomeEvent>,
    pub haptics: Vec<Vec<u32>>,
    pub resets: Vec<u32>,
    pub daily: DailyStats,
    /// Grant returned by every `consume_throw`
    pub grant: ThrowGrant,
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self {
            cues: Vec::new(),
            events: Vec::new(),
            haptics: Vec::new(),
            resets: Vec::new(),
            daily: DailyStats::default(),
            grant: ThrowGrant::Free,
        }
    }
}

impl RecordingHooks {
    pub fn practice() -> Self {
        Self {
            grant: ThrowGrant::Practice,
            ..Default::default()
        }
    }

    pub fn played(&self, cue: SoundCue) -> bool {
        self.cues.contains(&cue)
    }

    pub fn count(&self, cue: SoundCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }

    /// First recorded event matching `pred`
    pub fn find(&self, pred: impl Fn(&OutcomeEvent) -> bool) -> Option<&OutcomeEvent> {
        self.events.iter().find(|e| pred(e))
    }

    pub fn clear(&mut self) {
        self.cues.clear();
        self.events.clear();
        self.haptics.clear();
        self.resets.clear();
    }
}

impl FrameHooks for RecordingHooks {
    fn play(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    fn outcome(&mut self, event: OutcomeEvent) {
        if let OutcomeEvent::DailyStats(daily) = &event {
            self.daily = *daily;
        }
        self.events.push(event);
    }

    fn haptic(&mut self, pattern: &[u32]) {
        self.haptics.push(pattern.to_vec());
    }

    fn schedule_reset(&mut self, delay_ms: u32) {
        self.resets.push(delay_ms);
    }

    fn daily_stats(&self) -> DailyStats {
        self.daily
    }

    fn consume_throw(&mut self) -> ThrowGrant {
        self.grant
    }
}
