//! Provenance and attestation based trust scoring.
//!
//! The score only ever accumulates fixed, non-negative increments and stops
//! as soon as it reaches the configured maximum, so arbitrarily long
//! provenance or attestation lists cost at most one pass and can never push
//! the score out of `[0, max]`.

use std::collections::HashSet;

use tracing::{debug, warn};

use warden_contracts::{config::TrustConfig, manifest::ValidatedManifest, trust::TrustScore};
use warden_core::traits::{SignatureVerifier, TrustScorer};

/// A `TrustScorer` backed by an origin allow-list and a signature checker.
pub struct ProvenanceTrustScorer {
    max: f64,
    provenance_increment: f64,
    attestation_increment: f64,
    trusted_origins: Vec<String>,
    verifier: Box<dyn SignatureVerifier>,
}

impl ProvenanceTrustScorer {
    pub fn new(config: &TrustConfig, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self {
            max: config.max,
            provenance_increment: non_negative(config.provenance_increment),
            attestation_increment: non_negative(config.attestation_increment),
            trusted_origins: config.trusted_origins.clone(),
            verifier,
        }
    }

    /// Exact match, or prefix match when the pattern ends in `*`.
    fn origin_trusted(&self, uri: &str) -> bool {
        self.trusted_origins.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => uri.starts_with(prefix),
            None => pattern == uri,
        })
    }
}

impl TrustScorer for ProvenanceTrustScorer {
    fn score(&self, manifest: &ValidatedManifest) -> TrustScore {
        let trust = &manifest.manifest().trust;
        let mut total = 0.0_f64;

        let mut seen = HashSet::new();
        for uri in &trust.provenance {
            if total >= self.max {
                break;
            }
            if seen.insert(uri.as_str()) && self.origin_trusted(uri) {
                total += self.provenance_increment;
            }
        }

        let mut seen = HashSet::new();
        for attestation in &trust.attestations {
            if total >= self.max {
                break;
            }
            if !seen.insert(attestation.as_str()) {
                continue;
            }
            if self.verifier.verify_signature(attestation) {
                total += self.attestation_increment;
            } else {
                warn!(
                    agent_id = %manifest.agent_id(),
                    "attestation failed signature verification; contributes nothing"
                );
            }
        }

        let score = TrustScore::bounded(total, self.max);
        debug!(
            agent_id = %manifest.agent_id(),
            provenance = trust.provenance.len(),
            attestations = trust.attestations.len(),
            score = %score,
            "trust scored"
        );
        score
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}
