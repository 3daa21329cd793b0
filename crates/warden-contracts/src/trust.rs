//! Trust score type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A bounded credibility score for one manifest.
///
/// The only constructor clamps into `[0, max]`, so a `TrustScore` that exists
/// is always in range. `NaN` inputs collapse to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "RawTrustScore")]
pub struct TrustScore {
    value: f64,
    max: f64,
}

/// Wire form of `TrustScore`; deserialization re-clamps through `bounded`.
#[derive(Deserialize)]
struct RawTrustScore {
    value: f64,
    max: f64,
}

impl From<RawTrustScore> for TrustScore {
    fn from(raw: RawTrustScore) -> Self {
        Self::bounded(raw.value, raw.max)
    }
}

impl TrustScore {
    /// Clamp `value` into `[0, max]`. A non-positive or non-finite `max`
    /// produces a zero score with `max = 0`.
    pub fn bounded(value: f64, max: f64) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 0.0 };
        let value = if value.is_nan() { 0.0 } else { value.max(0.0).min(max) };
        Self { value, max }
    }

    /// A zero score on the default `[0, 1]` scale.
    pub fn zero() -> Self {
        Self::bounded(0.0, 1.0)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `value / max`, or zero when the scale is empty.
    pub fn fraction(&self) -> f64 {
        if self.max > 0.0 {
            self.value / self.max
        } else {
            0.0
        }
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}/{:.3}", self.value, self.max)
    }
}
