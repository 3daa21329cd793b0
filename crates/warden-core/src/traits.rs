//! Trait seams for the Warden gateway.
//!
//! The gateway and session only ever talk to these traits; concrete
//! implementations live in the policy, verify, audit and metrics crates.
//!
//! - `ManifestValidator`: untrusted document in, `ValidatedManifest` out
//! - `PolicyDeriver`: bounded sandbox policy, and elevation snapshots
//! - `TrustScorer`: bounded credibility score
//! - `ClaimVerifier`: total labeling of claims (may suspend on the oracle)
//! - `ClaimLogWriter`: append-only per-session claim log
//! - `MetricsAggregator`: pure snapshot over a session history
//!
//! External collaborators the gateway never implements itself:
//! `KnowledgeGraph`, `SignatureVerifier`, `ManifestRegistry`.

use async_trait::async_trait;

use warden_contracts::{
    claim::{Claim, ClaimRecord, OracleAnswer, VerificationResult},
    error::{ManifestRejection, OracleError, VerificationError, WardenResult},
    manifest::{AgentId, MemoryState, RawManifest, ValidatedManifest},
    metrics::MetricsSnapshot,
    sandbox::{ElevationRequest, SandboxPolicy},
    session::SessionHistory,
    trust::TrustScore,
};

/// Parses and checks an untrusted manifest document.
///
/// Implementations must be pure and deterministic, and must report every
/// violation rather than stopping at the first.
pub trait ManifestValidator: Send + Sync {
    fn validate(&self, raw: &RawManifest) -> Result<ValidatedManifest, ManifestRejection>;
}

/// Maps a validated manifest onto a bounded sandbox policy.
pub trait PolicyDeriver: Send + Sync {
    /// Derive the initial policy snapshot.
    ///
    /// Must never return a policy with any field above the configured
    /// ceilings, whatever the manifest requests. `trust` only scales the
    /// elevation budget; it never raises the initial limits.
    fn derive(&self, manifest: &ValidatedManifest, trust: &TrustScore) -> SandboxPolicy;

    /// Produce a new snapshot granting `request` on top of `current`.
    ///
    /// Requests beyond `current.max_trust_elevation` fail closed with
    /// `WardenError::ElevationRejected`. `current` is never modified.
    fn elevate(&self, current: &SandboxPolicy, request: &ElevationRequest) -> WardenResult<SandboxPolicy>;
}

/// Computes a bounded trust score from provenance and attestations.
pub trait TrustScorer: Send + Sync {
    fn score(&self, manifest: &ValidatedManifest) -> TrustScore;
}

/// Checks one attestation against the trusted key set.
///
/// Any `Fn(&str) -> bool` closure is a `SignatureVerifier`.
pub trait SignatureVerifier: Send + Sync {
    fn verify_signature(&self, attestation: &str) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn verify_signature(&self, attestation: &str) -> bool {
        self(attestation)
    }
}

/// The reference knowledge graph, queried one citation at a time.
///
/// The claim text is passed along so the oracle can tell a supporting fact
/// from a contradicting one.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    async fn query(&self, citation_id: &str, claim_text: &str) -> Result<OracleAnswer, OracleError>;
}

/// Decides whether uncited text reads as opinion or experience.
pub trait ClaimClassifier: Send + Sync {
    fn is_subjective(&self, text: &str) -> bool;
}

/// Assigns exactly one terminal label to a claim, or a transient error.
#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    async fn verify(&self, claim: &Claim) -> Result<VerificationResult, VerificationError>;
}

/// The append-only claim log owned by one session.
pub trait ClaimLogWriter: Send + Sync {
    /// Append one record and return its sequence number.
    ///
    /// Records are never modified or removed once appended.
    fn append(&self, record: &ClaimRecord) -> WardenResult<u64>;

    /// Every record appended so far, in append order.
    fn records(&self) -> Vec<ClaimRecord>;

    /// Mark the log complete. Called once when the session closes.
    fn seal(&self, session_id: &str) -> WardenResult<()>;
}

/// Anchors validated manifests and remembers each agent's last memory state.
pub trait ManifestRegistry: Send + Sync {
    /// Store the manifest and return its integrity hash.
    fn anchor(&self, manifest: &ValidatedManifest) -> WardenResult<String>;

    /// The memory state from the agent's most recent anchored manifest.
    fn prior_memory(&self, agent_id: &AgentId) -> Option<MemoryState>;
}

/// Computes behavioral metrics from a session history. Must be pure.
pub trait MetricsAggregator: Send + Sync {
    fn snapshot(&self, history: &SessionHistory<'_>) -> MetricsSnapshot;
}
