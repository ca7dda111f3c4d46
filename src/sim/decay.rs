//! Decaying scalar effects
//!
//! Slow-mo, zoom, screen shake and flash all relax exponentially toward a
//! neutral value once per frame. `Decaying` holds that logic in one place.

use serde::{Deserialize, Serialize};

/// Values closer than this to neutral snap to neutral
const SNAP_EPSILON: f64 = 0.001;

/// A scalar that relaxes toward `neutral` by `rate` every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decaying {
    pub value: f64,
    pub neutral: f64,
    /// Fraction of the offset from neutral kept per frame
    pub rate: f64,
}

impl Decaying {
    pub const fn new(neutral: f64, rate: f64) -> Self {
        Self {
            value: neutral,
            neutral,
            rate,
        }
    }

    /// Relax one frame toward neutral
    pub fn step(&mut self) {
        let offset = (self.value - self.neutral) * self.rate;
        self.value = if offset.abs() < SNAP_EPSILON {
            self.neutral
        } else {
            self.neutral + offset
        };
    }

    /// Overwrite the current value
    pub fn set(&mut self, value: f64) {
        if value.is_finite() {
            self.value = value;
        }
    }

    /// Raise the value to at least `value` (hit-stops, micro-freezes)
    pub fn at_least(&mut self, value: f64) {
        if value.is_finite() && value > self.value {
            self.value = value;
        }
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    pub fn is_neutral(&self) -> bool {
        self.value == self.neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decays_toward_neutral() {
        let mut zoom = Decaying::new(1.0, 0.92);
        zoom.set(2.0);
        zoom.step();
        assert!((zoom.get() - 1.92).abs() < 1e-12);

        for _ in 0..200 {
            zoom.step();
        }
        assert!(zoom.is_neutral());
    }

    #[test]
    fn test_at_least_never_lowers() {
        let mut slow_mo = Decaying::new(0.0, 0.95);
        slow_mo.set(0.9);
        slow_mo.at_least(0.5);
        assert_eq!(slow_mo.get(), 0.9);
        slow_mo.at_least(0.95);
        assert_eq!(slow_mo.get(), 0.95);
    }

    #[test]
    fn test_rejects_nan() {
        let mut shake = Decaying::new(0.0, 0.8);
        shake.set(f64::NAN);
        assert_eq!(shake.get(), 0.0);
    }
}
