//! Constraint strengths.

use std::fmt;

/// Priority weight of a constraint.
///
/// Anything below [`Strength::REQUIRED`] is soft: its violation is penalized
/// in the objective with this weight instead of being forbidden.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strength(f64);

impl Strength {
    pub const REQUIRED: Strength = Strength(1000.0);
    pub const STRONG: Strength = Strength(750.0);
    pub const MEDIUM: Strength = Strength(250.0);
    pub const WEAK: Strength = Strength(10.0);

    /// Create a custom strength, clamped into `[0, REQUIRED]`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, Self::REQUIRED.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Check if this is a required constraint.
    pub fn is_required(&self) -> bool {
        self.0 >= Self::REQUIRED.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            s if s == Self::REQUIRED => write!(f, "required"),
            s if s == Self::STRONG => write!(f, "strong"),
            s if s == Self::MEDIUM => write!(f, "medium"),
            s if s == Self::WEAK => write!(f, "weak"),
            Strength(value) => write!(f, "{value}"),
        }
    }
}
