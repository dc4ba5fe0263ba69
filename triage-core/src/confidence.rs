//! Mapping from model confidence to a display tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound (inclusive) of the `High` tier.
pub const HIGH_THRESHOLD: f64 = 0.80;
/// Lower bound (inclusive) of the `Medium` tier.
pub const MEDIUM_THRESHOLD: f64 = 0.60;

/// Discrete severity tier derived from a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Badge style used to emphasise the prediction.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::High => "success",
            Self::Medium => "warning",
            Self::Low => "danger",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Classify a confidence score. Boundary values belong to the higher tier.
///
/// Total over `f64`: anything that is not `>= 0.60` (including NaN) is `Low`.
pub fn classify(score: f64) -> ConfidenceTier {
    if score >= HIGH_THRESHOLD {
        ConfidenceTier::High
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_higher_tier() {
        assert_eq!(classify(0.80), ConfidenceTier::High);
        assert_eq!(classify(0.79999), ConfidenceTier::Medium);
        assert_eq!(classify(0.60), ConfidenceTier::Medium);
        assert_eq!(classify(0.59999), ConfidenceTier::Low);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(1.0), ConfidenceTier::High);
        assert_eq!(classify(0.0), ConfidenceTier::Low);
        assert_eq!(classify(f64::NAN), ConfidenceTier::Low);
    }

    #[test]
    fn test_badge_styles() {
        assert_eq!(classify(0.95).badge(), "success");
        assert_eq!(classify(0.78).badge(), "warning");
        assert_eq!(classify(0.2).badge(), "danger");
    }
}
