//! Claim, verification label and claim-log record types.
//!
//! A claim is labeled, never punished: every verification outcome is appended
//! to the session's claim log as a `ClaimRecord` and never rewritten.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for one claim submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub String);

impl ClaimId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A factual or subjective assertion emitted by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: ClaimId,
    pub text: String,
    /// Knowledge-graph reference ids, in the order the agent cited them.
    pub citations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Claim {
    /// Build a claim stamped with the current time.
    pub fn new(claim_id: ClaimId, text: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            claim_id,
            text: text.into(),
            citations,
            timestamp: Utc::now(),
        }
    }
}

/// Terminal verification label. Every claim ends in exactly one of these or
/// in a transient `VerificationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLabel {
    Verified,
    Unverified,
    Subjective,
    Hallucination,
}

impl fmt::Display for VerificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationLabel::Verified => "verified",
            VerificationLabel::Unverified => "unverified",
            VerificationLabel::Subjective => "subjective",
            VerificationLabel::Hallucination => "hallucination",
        };
        f.write_str(s)
    }
}

/// The labeled outcome for one claim.
///
/// `matched_reference` is only ever set on `Verified` results; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claim_id: ClaimId,
    pub label: VerificationLabel,
    pub matched_reference: Option<String>,
    pub rationale: String,
}

impl VerificationResult {
    pub fn verified(claim_id: ClaimId, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            claim_id,
            label: VerificationLabel::Verified,
            rationale: format!("citation '{reference}' supports the claim"),
            matched_reference: Some(reference),
        }
    }

    pub fn unverified(claim_id: ClaimId, rationale: impl Into<String>) -> Self {
        Self::unmatched(claim_id, VerificationLabel::Unverified, rationale)
    }

    pub fn subjective(claim_id: ClaimId, rationale: impl Into<String>) -> Self {
        Self::unmatched(claim_id, VerificationLabel::Subjective, rationale)
    }

    pub fn hallucination(claim_id: ClaimId, rationale: impl Into<String>) -> Self {
        Self::unmatched(claim_id, VerificationLabel::Hallucination, rationale)
    }

    fn unmatched(claim_id: ClaimId, label: VerificationLabel, rationale: impl Into<String>) -> Self {
        Self {
            claim_id,
            label,
            matched_reference: None,
            rationale: rationale.into(),
        }
    }
}

/// What the knowledge-graph oracle says about one citation relative to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OracleAnswer {
    /// The cited fact supports the claim.
    Match,
    /// The cited fact resolves and explicitly contradicts the claim.
    Contradiction,
    /// The citation does not resolve, or resolves to something unrelated.
    NotFound,
}

/// An immutable entry in a session's claim log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim: Claim,
    pub result: VerificationResult,
    pub recorded_at: DateTime<Utc>,
}

/// One outbound message from an agent, with the claims it makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub claims: Vec<Claim>,
}
