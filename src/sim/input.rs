//! Precision input tracking
//!
//! Turns the raw "control pressed" level into per-frame edges and hold
//! lengths. Everything here counts input frames, so slow motion never
//! changes what counts as a tap.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Releases within this many held frames count as taps
pub const TAP_GRACE_FRAMES: u32 = 4;
/// Buffered inputs older than this are discarded
pub const BUFFER_WINDOW_MS: f64 = 200.0;
/// Slow-mo above this starts buffering
pub const BUFFER_START_SLOW_MO: f64 = 0.8;
/// Slow-mo below this flushes the buffer
pub const BUFFER_STOP_SLOW_MO: f64 = 0.3;

/// Edge-triggered input facts for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionInput {
    pub pressed_this_frame: bool,
    pub released_this_frame: bool,
    /// Frames the control has been held (1 on the press frame)
    pub hold_duration: u32,
    pub last_pressed_state: bool,
    /// `hold_duration` captured on the release frame
    pub hold_duration_at_release: u32,
}

impl PrecisionInput {
    /// Advance one input frame with the raw pressed level and any buffered facts
    pub fn update(&mut self, pressed: bool, buffered: BufferedFacts) {
        let was_pressed = self.last_pressed_state;
        self.pressed_this_frame = pressed && !was_pressed;
        self.released_this_frame = !pressed && was_pressed;

        if self.released_this_frame {
            self.hold_duration_at_release = self.hold_duration;
        }

        if buffered.tap {
            // A whole press+release that happened while time was frozen
            self.pressed_this_frame = true;
            self.released_this_frame = true;
            self.hold_duration_at_release = 1;
        } else {
            if buffered.press {
                self.pressed_this_frame = true;
            }
            if buffered.release && !self.released_this_frame {
                self.released_this_frame = true;
                self.hold_duration_at_release = self.hold_duration;
            }
        }

        if pressed {
            self.hold_duration += 1;
        } else {
            self.hold_duration = 0;
        }
        self.last_pressed_state = pressed;
    }

    /// Released quickly enough to count as a tap
    pub fn is_tap_release(&self) -> bool {
        self.released_this_frame && self.hold_duration_at_release <= TAP_GRACE_FRAMES
    }

    /// The frame a press stops being a tap candidate
    pub fn grace_expired_this_frame(&self) -> bool {
        self.last_pressed_state && self.hold_duration == TAP_GRACE_FRAMES + 1
    }

    /// Held past the tap grace window
    pub fn is_holding(&self) -> bool {
        self.last_pressed_state && self.hold_duration > TAP_GRACE_FRAMES
    }
}

/// Kinds of input the host can buffer during heavy slow motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferedKind {
    Press,
    Release,
    Tap,
}

/// Facts drained from the buffer, consumed by exactly one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferedFacts {
    pub press: bool,
    pub release: bool,
    pub tap: bool,
}

/// Queue of inputs captured while slow-mo is heavy.
///
/// While buffering, raw edges are held here instead of reaching
/// `PrecisionInput`; they are handed over once when buffering stops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBuffer {
    active: bool,
    /// Raw control level as of the last captured edge
    level: bool,
    pending: VecDeque<(BufferedKind, f64)>,
}

impl InputBuffer {
    pub fn is_buffering(&self) -> bool {
        self.active
    }

    /// Queue a raw edge if the level changed since the last one
    pub fn observe(&mut self, pressed: bool, now_ms: f64) {
        if !self.active || pressed == self.level {
            return;
        }
        self.level = pressed;
        let kind = if pressed {
            BufferedKind::Press
        } else {
            BufferedKind::Release
        };
        self.push(kind, now_ms);
    }

    /// Record an input; ignored unless buffering
    pub fn push(&mut self, kind: BufferedKind, now_ms: f64) {
        if !self.active {
            return;
        }
        while let Some(&(_, t)) = self.pending.front() {
            if now_ms - t < BUFFER_WINDOW_MS {
                break;
            }
            self.pending.pop_front();
        }
        self.pending.push_back((kind, now_ms));
    }

    /// Start or stop buffering from the current slow-mo.
    ///
    /// `pressed` is the raw level edges are measured from once buffering
    /// starts. Returns the buffered facts on the frame buffering stops.
    pub fn follow_slow_mo(&mut self, slow_mo: f64, pressed: bool) -> BufferedFacts {
        if !self.active && slow_mo > BUFFER_START_SLOW_MO {
            self.active = true;
            self.level = pressed;
            self.pending.clear();
            log::debug!("Input buffering started");
        } else if self.active && slow_mo < BUFFER_STOP_SLOW_MO {
            self.active = false;
            return self.drain();
        }
        BufferedFacts::default()
    }

    fn drain(&mut self) -> BufferedFacts {
        let mut facts = BufferedFacts::default();
        for (kind, _) in self.pending.drain(..) {
            match kind {
                BufferedKind::Press => facts.press = true,
                // Pressed and released while frozen
                BufferedKind::Release if facts.press => {
                    facts.press = false;
                    facts.tap = true;
                }
                BufferedKind::Release => facts.release = true,
                BufferedKind::Tap => facts.tap = true,
            }
        }
        facts
    }

    pub fn clear(&mut self) {
        self.active = false;
        self.level = false;
        self.pending.clear();
    }
}
