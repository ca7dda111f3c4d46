//! Sound cue vocabulary
//!
//! The core never synthesizes audio. It names the cue and the host's audio
//! collaborator decides how it sounds.

use serde::{Deserialize, Serialize};

/// Sound cues fired by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Control pressed on the pad
    ChargeStart,
    /// Charge power entered the sweet spot
    SweetSpotClick,
    /// Thrower released
    Launch,
    /// Air tap accepted (float)
    AirFloat,
    /// Air hold brake (throttled)
    AirBrake,
    /// Forward thrust accepted
    Thrust,
    /// Stamina or cap denied an action
    ActionDenied,
    /// Stamina running out
    StaminaLow,
    /// Ring collected (0-based ring index)
    RingCollect { index: u8 },
    /// Ground contact, intensity 0..1
    Impact { intensity: f64 },
    /// Slide started
    Slide,
    /// Slide tap accepted
    SlideExtend,
    /// Slide hold brake (throttled)
    SlideBrake,
    /// Record-zone heartbeat, intensity 0..1
    Heartbeat { intensity: f64 },
    /// On pace to beat the record
    RecordBreak,
    /// Passed the personal best inside the precision zone
    PbDing,
    /// Came to rest
    Land,
    /// Landed within the perfect window
    Perfect,
    /// Reached the Zeno target
    LevelUp,
    /// Hit-stop at the moment of falling
    FailImpact,
    /// Regular fall sound
    Fall,
    /// Rare fall sound
    WilhelmScream,
    /// Tutorial overlay opened
    TutorialPrompt,
}

impl SoundCue {
    /// Cues that are purely decorative and dropped under reduced effects
    pub fn is_ambient(&self) -> bool {
        matches!(
            self,
            SoundCue::Heartbeat { .. } | SoundCue::SweetSpotClick | SoundCue::PbDing
        )
    }
}

/// Haptic vibration patterns (milliseconds on/off)
pub mod haptics {
    pub const LAUNCH: &[u32] = &[15];
    pub const RING: &[u32] = &[10, 20, 10];
    pub const LAND: &[u32] = &[20];
    pub const PERFECT: &[u32] = &[30, 40, 30];
    pub const LEVEL_UP: &[u32] = &[40, 30, 40, 30, 80];
    pub const FAIL: &[u32] = &[60];
    pub const DENIED: &[u32] = &[8];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_cues() {
        assert!(SoundCue::Heartbeat { intensity: 1.0 }.is_ambient());
        assert!(!SoundCue::Land.is_ambient());
        assert!(!SoundCue::RingCollect { index: 2 }.is_ambient());
    }
}
