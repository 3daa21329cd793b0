//! The ingestion gateway: untrusted manifest in, sandbox assignment out.
//!
//! Every admission runs the same pipeline:
//!
//!   Validate → Admission rules → Lease agent id → Trust score → Derive policy → Anchor
//!
//! No policy is derived for a manifest that failed validation or an
//! admission rule, and no two active sessions can share an agent id.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use warden_contracts::{
    config::AdmissionConfig,
    error::{WardenError, WardenResult},
    manifest::{AgentId, MemoryState, RawManifest, ValidatedManifest},
    session::{SandboxAssignment, SessionId},
};

use crate::traits::{ManifestRegistry, ManifestValidator, PolicyDeriver, TrustScorer};

type ActiveAgents = Arc<Mutex<HashSet<AgentId>>>;

/// Holds an agent id in the gateway's active set until dropped.
///
/// Owned by the `Session` opened from an `Admission`, so tearing the session
/// down (or dropping an admission that never became a session) frees the id.
#[derive(Debug)]
pub struct SessionLease {
    agent_id: AgentId,
    active: ActiveAgents,
}

impl SessionLease {
    fn acquire(active: &ActiveAgents, agent_id: &AgentId) -> WardenResult<Self> {
        let mut set = active.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(agent_id.clone()) {
            return Err(WardenError::DuplicateSession {
                agent_id: agent_id.to_string(),
            });
        }
        Ok(Self {
            agent_id: agent_id.clone(),
            active: Arc::clone(active),
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let mut set = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        set.remove(&self.agent_id);
        debug!(agent_id = %self.agent_id, "session lease released");
    }
}

/// Everything needed to open a session for an admitted agent.
#[derive(Debug)]
pub struct Admission {
    pub assignment: SandboxAssignment,
    pub manifest: ValidatedManifest,
    /// Memory state anchored for this agent before this admission, if any.
    pub prior_memory: Option<MemoryState>,
    pub(crate) lease: SessionLease,
}

/// The manifest ingestion gateway.
///
/// One gateway serves many sessions. Validation, scoring and derivation are
/// pure calls; the only shared mutable state is the active agent set.
pub struct Gateway {
    validator: Box<dyn ManifestValidator>,
    scorer: Box<dyn TrustScorer>,
    deriver: Arc<dyn PolicyDeriver>,
    registry: Option<Box<dyn ManifestRegistry>>,
    /// Lowercased once at construction.
    forbidden_constraint_terms: Vec<String>,
    active: ActiveAgents,
}

impl Gateway {
    pub fn new(
        validator: Box<dyn ManifestValidator>,
        scorer: Box<dyn TrustScorer>,
        deriver: Arc<dyn PolicyDeriver>,
        admission: &AdmissionConfig,
    ) -> Self {
        Self {
            validator,
            scorer,
            deriver,
            registry: None,
            forbidden_constraint_terms: admission
                .forbidden_constraint_terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Anchor every admitted manifest in `registry`.
    pub fn with_registry(mut self, registry: Box<dyn ManifestRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Number of agent ids currently held by live sessions or admissions.
    pub fn active_sessions(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run the full ingestion pipeline for one raw manifest.
    ///
    /// # Errors
    ///
    /// - `ManifestRejected` listing every schema violation
    /// - `AdmissionDenied` when a self-imposed constraint names a forbidden term
    /// - `DuplicateSession` when the agent id is already active
    /// - whatever the registry returns if anchoring fails
    pub fn admit(&self, raw: &RawManifest) -> WardenResult<Admission> {
        debug!(format = %raw.format, bytes = raw.text.len(), "admitting manifest");

        // ── Step 1: Schema validation ────────────────────────────────────────
        let manifest = self.validator.validate(raw).map_err(|rejection| {
            warn!(
                violations = rejection.errors.len(),
                fields = ?rejection.fields().collect::<Vec<_>>(),
                "manifest rejected"
            );
            rejection
        })?;
        let agent_id = manifest.agent_id().clone();

        // ── Step 2: Admission rules ──────────────────────────────────────────
        self.check_constraints(&manifest)?;

        // ── Step 3: Reserve the agent id ─────────────────────────────────────
        let lease = SessionLease::acquire(&self.active, &agent_id).map_err(|e| {
            warn!(agent_id = %agent_id, "agent already has an active session");
            e
        })?;

        // ── Steps 4 & 5: Trust, then policy ──────────────────────────────────
        let trust_score = self.scorer.score(&manifest);
        let policy = self.deriver.derive(&manifest, &trust_score);

        // ── Step 6: Anchor ───────────────────────────────────────────────────
        //
        // Prior memory must be read before this manifest replaces it.
        let (prior_memory, integrity_hash) = match &self.registry {
            Some(registry) => {
                let prior = registry.prior_memory(&agent_id);
                let hash = registry.anchor(&manifest)?;
                (prior, Some(hash))
            }
            None => (None, None),
        };

        let assignment = SandboxAssignment {
            session_id: SessionId::new(),
            agent_id: agent_id.clone(),
            policy,
            trust_score,
            integrity_hash,
            issued_at: Utc::now(),
        };

        info!(
            session_id = %assignment.session_id,
            agent_id = %agent_id,
            display_name = %manifest.display_name(),
            trust = %assignment.trust_score,
            cpu_limit = assignment.policy.cpu_limit,
            memory_limit_gb = assignment.policy.memory_limit_gb,
            network = %assignment.policy.network_policy,
            filesystem = %assignment.policy.filesystem_policy,
            "manifest admitted"
        );

        Ok(Admission {
            assignment,
            manifest,
            prior_memory,
            lease,
        })
    }

    /// The policy deriver shared with sessions for elevation requests.
    pub fn deriver(&self) -> Arc<dyn PolicyDeriver> {
        Arc::clone(&self.deriver)
    }

    fn check_constraints(&self, manifest: &ValidatedManifest) -> WardenResult<()> {
        for constraint in &manifest.manifest().intent.constraints {
            let lowered = constraint.to_lowercase();
            if let Some(term) = self
                .forbidden_constraint_terms
                .iter()
                .find(|term| lowered.contains(term.as_str()))
            {
                warn!(
                    agent_id = %manifest.agent_id(),
                    term = %term,
                    "constraint references a forbidden term"
                );
                return Err(WardenError::AdmissionDenied {
                    agent_id: manifest.agent_id().to_string(),
                    reason: format!("constraint '{constraint}' references forbidden term '{term}'"),
                });
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_contracts::{
        config::AdmissionConfig,
        error::{ValidationError, WardenError},
        manifest::{AgentId, RawManifest},
        sandbox::NetworkPolicy,
    };

    use super::Gateway;
    use crate::testing::{manifest_json, JsonValidator, MemoryRegistry, StubDeriver, StubScorer};

    fn gateway() -> Gateway {
        Gateway::new(
            Box::new(JsonValidator),
            Box::new(StubScorer { value: 0.5 }),
            Arc::new(StubDeriver),
            &AdmissionConfig::default(),
        )
    }

    #[test]
    fn test_admit_returns_assignment() {
        let gateway = gateway();
        let admission = gateway.admit(&RawManifest::json(manifest_json("agent-1", &[]))).unwrap();

        assert_eq!(admission.assignment.agent_id, AgentId::new("agent-1"));
        assert_eq!(admission.assignment.policy.network_policy, NetworkPolicy::EgressDeny);
        assert_eq!(admission.assignment.trust_score.value(), 0.5);
        assert!(admission.assignment.integrity_hash.is_none());
        assert_eq!(gateway.active_sessions(), 1);
    }

    /// A rejected manifest never reaches scoring or derivation, and holds no lease.
    #[test]
    fn test_rejection_propagates() {
        let gateway = gateway();
        let result = gateway.admit(&RawManifest::json("{ not json"));

        match result {
            Err(WardenError::ManifestRejected(rejection)) => {
                assert!(matches!(rejection.errors[0], ValidationError::Malformed { .. }));
            }
            other => panic!("expected ManifestRejected, got {:?}", other),
        }
        assert_eq!(gateway.active_sessions(), 0);
    }

    #[test]
    fn test_forbidden_constraint_denied() {
        let gateway = gateway();
        let raw = RawManifest::json(manifest_json("agent-k", &["Needs KERNEL module access"]));

        match gateway.admit(&raw) {
            Err(WardenError::AdmissionDenied { agent_id, reason }) => {
                assert_eq!(agent_id, "agent-k");
                assert!(reason.contains("kernel"), "reason should name the term: {reason}");
            }
            other => panic!("expected AdmissionDenied, got {:?}", other),
        }
        assert_eq!(gateway.active_sessions(), 0);
    }

    #[test]
    fn test_duplicate_agent_id_refused_until_lease_dropped() {
        let gateway = gateway();
        let raw = RawManifest::json(manifest_json("agent-dup", &[]));

        let first = gateway.admit(&raw).unwrap();
        match gateway.admit(&raw) {
            Err(WardenError::DuplicateSession { agent_id }) => assert_eq!(agent_id, "agent-dup"),
            other => panic!("expected DuplicateSession, got {:?}", other),
        }

        drop(first);
        assert_eq!(gateway.active_sessions(), 0);
        assert!(gateway.admit(&raw).is_ok());
    }

    #[test]
    fn test_registry_anchors_and_reports_prior_memory() {
        let registry = MemoryRegistry::default();
        let gateway = gateway().with_registry(Box::new(registry.clone()));
        let raw = RawManifest::json(manifest_json("agent-r", &[]));

        let first = gateway.admit(&raw).unwrap();
        assert!(first.prior_memory.is_none(), "first admission has no prior state");
        assert!(first.assignment.integrity_hash.is_some());
        drop(first);

        let second = gateway.admit(&raw).unwrap();
        let prior = second.prior_memory.expect("second admission sees the first anchor");
        assert_eq!(prior.continuity_hash, "lineage-agent-r");
        assert_eq!(registry.anchored(), 2);
    }
}
