//! Marker-based subjective claim classifier.

use warden_contracts::config::VerificationConfig;
use warden_core::traits::ClaimClassifier;

/// Flags uncited text as subjective when it reads as opinion.
///
/// A statement is subjective when it contains an opinion marker phrase, or
/// when it has no factual marker at all (no digit and no factual verb).
/// Markers match whole words only, case-insensitively.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    /// Each marker pre-split into lowercase words.
    opinion_markers: Vec<Vec<String>>,
    factual_markers: Vec<String>,
}

impl MarkerClassifier {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            opinion_markers: config
                .opinion_markers
                .iter()
                .map(|m| words(m))
                .filter(|m| !m.is_empty())
                .collect(),
            factual_markers: config.factual_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

impl ClaimClassifier for MarkerClassifier {
    fn is_subjective(&self, text: &str) -> bool {
        let tokens = words(text);

        let opinionated = self
            .opinion_markers
            .iter()
            .any(|marker| tokens.windows(marker.len()).any(|w| w == marker.as_slice()));
        if opinionated {
            return true;
        }

        let factual = text.chars().any(|c| c.is_ascii_digit())
            || tokens.iter().any(|t| self.factual_markers.contains(t));
        !factual
    }
}

/// Lowercase alphanumeric words; apostrophes stay inside words.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
