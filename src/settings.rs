//! Session settings
//!
//! Read once when the session starts and passed to every `tick` unchanged.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Achievement that unlocks cinematic slow motion when gated
pub const SLOW_MO_UNLOCK_ACHIEVEMENT: &str = "dist_400";

/// Player preferences that shape the simulation's feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Accessibility ===
    /// Reduced effects: no cinematic slow-mo, zoom, shake or flash
    pub reduce_fx: bool,
    /// Haptic feedback on launch, rings, landing and falls
    pub haptics: bool,

    // === Onboarding ===
    /// Show tutorial overlays the first time each control is available
    pub tutorials: bool,

    // === Progression ===
    /// Cinematic slow motion only after the `dist_400` achievement
    pub slow_mo_requires_unlock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reduce_fx: false,
            haptics: true,
            tutorials: true,
            slow_mo_requires_unlock: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Invalid settings in {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                log::info!("Using default settings ({}: {})", path.display(), err);
                Self::default()
            }
        }
    }

    /// Whether cinematic slow-mo may play given the unlocked achievements
    pub fn slow_mo_enabled<'a>(&self, mut achievements: impl Iterator<Item = &'a String>) -> bool {
        if self.reduce_fx {
            return false;
        }
        !self.slow_mo_requires_unlock || achievements.any(|a| a == SLOW_MO_UNLOCK_ACHIEVEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "reduce_fx": true }"#).unwrap();
        assert!(settings.reduce_fx);
        assert!(settings.tutorials);
        assert!(settings.haptics);
    }

    #[test]
    fn test_printed_settings_reload() {
        let settings = Settings {
            haptics: false,
            slow_mo_requires_unlock: true,
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"slow_mo_requires_unlock\": true"));
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Settings::from_json("{ nope").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load(Path::new("/definitely/not/here.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_slow_mo_gate() {
        let unlocked = vec!["dist_400".to_string()];
        let none: Vec<String> = Vec::new();
        let gated = Settings {
            slow_mo_requires_unlock: true,
            ..Default::default()
        };
        assert!(!gated.slow_mo_enabled(none.iter()));
        assert!(gated.slow_mo_enabled(unlocked.iter()));
        assert!(Settings::default().slow_mo_enabled(none.iter()));

        let reduced = Settings {
            reduce_fx: true,
            ..Default::default()
        };
        assert!(!reduced.slow_mo_enabled(unlocked.iter()));
    }
}
