//! Behavioral metrics snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::VerificationLabel;

/// How many claims in the log carry each label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelTally {
    pub verified: usize,
    pub unverified: usize,
    pub subjective: usize,
    pub hallucination: usize,
}

impl LabelTally {
    pub fn record(&mut self, label: VerificationLabel) {
        match label {
            VerificationLabel::Verified => self.verified += 1,
            VerificationLabel::Unverified => self.unverified += 1,
            VerificationLabel::Subjective => self.subjective += 1,
            VerificationLabel::Hallucination => self.hallucination += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.verified + self.unverified + self.subjective + self.hallucination
    }
}

/// Point-in-time behavioral scores for one session.
///
/// Always recomputed from the full history; never patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// In `[0, 1]`; never decreases as messages are appended.
    pub complexity: f64,
    /// Distinct-to-total content ratio, in `[0, 1]`.
    pub novelty: f64,
    /// Lineage similarity to the prior recorded state, in `[0, 1]`.
    pub continuity: f64,
    /// Weighted combination of the three scores, in `[0, 1]`.
    pub composite: f64,
    pub labels: LabelTally,
    pub message_count: usize,
    pub claim_count: usize,
    pub computed_at: DateTime<Utc>,
}
