// ── Physical quantities ──

use std::fmt;

/// A magnitude with a unit, e.g. `2.0 dB`.
///
/// Only the magnitude travels on the wire. The unit stays with the
/// attribute: a write supplies a bare number and inherits the unit of
/// the quantity it replaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    /// Same unit, new magnitude.
    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: self.unit.clone(),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}
