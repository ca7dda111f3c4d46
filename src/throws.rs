//! Throw economy
//!
//! Free throws regenerate over time up to a cap. Permanent throws come from
//! rewards and never expire. With neither left, the player throws in
//! practice mode: the simulation runs but nothing is scored or saved.

use serde::{Deserialize, Serialize};

/// Free throws stop regenerating at this count
pub const FREE_THROWS_CAP: u32 = 5;
/// One free throw regenerates per interval
pub const FREE_THROW_REGEN_MS: u64 = 20 * 60 * 1000;

/// What paid for a throw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrowGrant {
    /// Premium players never spend throws
    Unlimited,
    Free,
    Permanent,
    /// Nothing left: run without scoring
    Practice,
}

impl ThrowGrant {
    pub fn is_practice(&self) -> bool {
        matches!(self, ThrowGrant::Practice)
    }
}

/// Persisted throw counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowState {
    pub free_throws: u32,
    pub permanent_throws: u32,
    /// Timestamp the regeneration clock last advanced from
    pub last_regen_ms: u64,
    #[serde(default)]
    pub premium: bool,
}

impl Default for ThrowState {
    fn default() -> Self {
        Self {
            free_throws: FREE_THROWS_CAP,
            permanent_throws: 0,
            last_regen_ms: 0,
            premium: false,
        }
    }
}

impl ThrowState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            last_regen_ms: now_ms,
            ..Default::default()
        }
    }

    /// Credit free throws for the time elapsed since the last regeneration
    pub fn regenerate(&mut self, now_ms: u64) {
        if self.premium {
            return;
        }
        if self.free_throws >= FREE_THROWS_CAP {
            self.last_regen_ms = now_ms;
            return;
        }
        let elapsed = now_ms.saturating_sub(self.last_regen_ms);
        let earned = elapsed / FREE_THROW_REGEN_MS;
        if earned == 0 {
            return;
        }
        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        self.free_throws = self.free_throws.saturating_add(earned).min(FREE_THROWS_CAP);
        // Keep the partial interval so regeneration never loses time
        self.last_regen_ms = now_ms - elapsed % FREE_THROW_REGEN_MS;
        log::debug!("Regenerated free throws: now {}", self.free_throws);
    }

    /// Spend one throw: free, then permanent, then practice mode
    pub fn consume(&mut self) -> ThrowGrant {
        if self.premium {
            ThrowGrant::Unlimited
        } else if self.free_throws > 0 {
            self.free_throws -= 1;
            ThrowGrant::Free
        } else if self.permanent_throws > 0 {
            self.permanent_throws -= 1;
            ThrowGrant::Permanent
        } else {
            log::info!("Out of throws, entering practice mode");
            ThrowGrant::Practice
        }
    }

    pub fn add_permanent(&mut self, amount: u32) {
        self.permanent_throws = self.permanent_throws.saturating_add(amount);
    }

    pub fn can_make_real_throw(&self) -> bool {
        self.premium || self.free_throws > 0 || self.permanent_throws > 0
    }

    /// Throws available for display; `None` means unlimited
    pub fn total(&self) -> Option<u32> {
        if self.premium {
            None
        } else {
            Some(self.free_throws + self.permanent_throws)
        }
    }

    /// Milliseconds until the next free throw, 0 when capped
    pub fn ms_until_next(&self, now_ms: u64) -> u64 {
        if self.premium || self.free_throws >= FREE_THROWS_CAP {
            return 0;
        }
        let elapsed = now_ms.saturating_sub(self.last_regen_ms);
        FREE_THROW_REGEN_MS.saturating_sub(elapsed)
    }
}

/// Format a countdown as `M:SS`, empty when nothing is pending
pub fn format_regen_time(ms: u64) -> String {
    if ms == 0 {
        return String::new();
    }
    let total_seconds = ms.div_ceil(1000);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
