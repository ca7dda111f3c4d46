//! Personal leaderboard
//!
//! Top 10 landing distances, longest first.

use serde::{Deserialize, Serialize};

/// Maximum number of entries to keep
pub const MAX_ENTRIES: usize = 10;
/// Landings at or below this distance are not recorded
pub const MIN_DISTANCE: f64 = 50.0;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Landing distance (8 decimals)
    pub distance: f64,
    /// Score gained by the throw
    pub score: f64,
    /// Zeno level at the time of the landing
    pub level: u32,
    /// Host timestamp (ms) of the landing
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a distance qualifies for the leaderboard
    pub fn qualifies(&self, distance: f64) -> bool {
        if !distance.is_finite() || distance <= MIN_DISTANCE {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| distance > e.distance)
    }

    /// Rank a distance would achieve (0-based), `None` if it doesn't qualify
    pub fn potential_rank(&self, distance: f64) -> Option<usize> {
        if !self.qualifies(distance) {
            return None;
        }
        let rank = self.entries.iter().position(|e| distance > e.distance);
        Some(rank.unwrap_or(self.entries.len()))
    }

    /// Insert an entry if it qualifies. Returns its 0-based rank.
    pub fn add(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.distance)?;
        self.entries.insert(rank, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_distance(&self) -> Option<f64> {
        self.entries.first().map(|e| e.distance)
    }
}
