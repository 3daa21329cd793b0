//! Claim verification against the knowledge-graph oracle.
//!
//! State machine per claim:
//!
//!   Pending → Subjective     (no citations, classifier says opinion)
//!   Pending → Unverified     (no citations otherwise)
//!   Pending → Verified       (first citation the oracle matches)
//!   Pending → Hallucination  (no match, at least one contradiction)
//!   Pending → Unverified     (every citation not found)
//!
//! Oracle failure or timeout is a transient `VerificationError`, never a
//! label. The whole resolution of one claim shares a single timeout budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use warden_contracts::{
    claim::{Claim, OracleAnswer, VerificationResult},
    config::VerificationConfig,
    error::{OracleError, VerificationError},
};
use warden_core::traits::{ClaimClassifier, ClaimVerifier, KnowledgeGraph};

/// The Warden claim verifier.
pub struct GraphClaimVerifier {
    graph: Arc<dyn KnowledgeGraph>,
    classifier: Box<dyn ClaimClassifier>,
    timeout: Duration,
}

impl GraphClaimVerifier {
    pub fn new(
        graph: Arc<dyn KnowledgeGraph>,
        classifier: Box<dyn ClaimClassifier>,
        config: &VerificationConfig,
    ) -> Self {
        Self {
            graph,
            classifier,
            timeout: Duration::from_millis(config.oracle_timeout_ms),
        }
    }

    /// Walk the citations in order. Stops at the first match.
    async fn resolve_citations(&self, claim: &Claim) -> Result<VerificationResult, OracleError> {
        let mut contradicted_by: Option<&str> = None;

        for citation in &claim.citations {
            match self.graph.query(citation, &claim.text).await? {
                OracleAnswer::Match => {
                    return Ok(VerificationResult::verified(claim.claim_id.clone(), citation.as_str()));
                }
                OracleAnswer::Contradiction => {
                    contradicted_by.get_or_insert(citation.as_str());
                }
                OracleAnswer::NotFound => {}
            }
        }

        Ok(match contradicted_by {
            Some(citation) => VerificationResult::hallucination(
                claim.claim_id.clone(),
                format!("citation '{citation}' contradicts the claim and no citation supports it"),
            ),
            None => VerificationResult::unverified(
                claim.claim_id.clone(),
                "no cited reference supports the claim",
            ),
        })
    }
}

#[async_trait]
impl ClaimVerifier for GraphClaimVerifier {
    async fn verify(&self, claim: &Claim) -> Result<VerificationResult, VerificationError> {
        if claim.citations.is_empty() {
            let result = if self.classifier.is_subjective(&claim.text) {
                VerificationResult::subjective(claim.claim_id.clone(), "uncited statement of opinion or experience")
            } else {
                VerificationResult::unverified(claim.claim_id.clone(), "factual statement without citations")
            };
            debug!(claim_id = %claim.claim_id, label = %result.label, "uncited claim labeled");
            return Ok(result);
        }

        match tokio::time::timeout(self.timeout, self.resolve_citations(claim)).await {
            Ok(Ok(result)) => {
                debug!(
                    claim_id = %claim.claim_id,
                    citations = claim.citations.len(),
                    label = %result.label,
                    "cited claim labeled"
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!(claim_id = %claim.claim_id, error = %e, "oracle query failed");
                Err(VerificationError::OracleUnavailable {
                    claim_id: claim.claim_id.clone(),
                    reason: e.reason,
                })
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(claim_id = %claim.claim_id, timeout_ms, "oracle query timed out");
                Err(VerificationError::Timeout {
                    claim_id: claim.claim_id.clone(),
                    timeout_ms,
                })
            }
        }
    }
}
