//! Mock collaborators shared by the gateway and session tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use warden_contracts::{
    claim::{Claim, ClaimRecord, VerificationResult},
    error::{ManifestRejection, ValidationError, VerificationError, WardenError, WardenResult},
    manifest::{AgentId, Manifest, MemoryState, RawManifest, ValidatedManifest},
    metrics::{LabelTally, MetricsSnapshot},
    sandbox::{ElevationRequest, FilesystemPolicy, NetworkPolicy, SandboxPolicy, TrustElevation},
    session::SessionHistory,
    trust::TrustScore,
};

use crate::traits::{
    ClaimLogWriter, ClaimVerifier, ManifestRegistry, ManifestValidator, MetricsAggregator,
    PolicyDeriver, TrustScorer,
};

pub fn manifest_json(agent_id: &str, constraints: &[&str]) -> String {
    serde_json::json!({
        "agent_id": agent_id,
        "intent": { "mission": "catalogue moons", "constraints": constraints },
        "capabilities": { "interfaces": ["text"] },
        "memory_state": { "continuity_hash": format!("lineage-{agent_id}") },
        "protocol_version": "1.0"
    })
    .to_string()
}

/// Accepts anything `serde_json` can turn into a `Manifest`.
pub struct JsonValidator;

impl ManifestValidator for JsonValidator {
    fn validate(&self, raw: &RawManifest) -> Result<ValidatedManifest, ManifestRejection> {
        serde_json::from_str::<Manifest>(&raw.text)
            .map(ValidatedManifest::from_checked)
            .map_err(|e| {
                ManifestRejection::single(ValidationError::Malformed {
                    format: raw.format,
                    reason: e.to_string(),
                })
            })
    }
}

pub struct StubScorer {
    pub value: f64,
}

impl TrustScorer for StubScorer {
    fn score(&self, _manifest: &ValidatedManifest) -> TrustScore {
        TrustScore::bounded(self.value, 1.0)
    }
}

/// Always grants the baseline, with two cpus and one GB of elevation headroom.
pub struct StubDeriver;

impl PolicyDeriver for StubDeriver {
    fn derive(&self, _manifest: &ValidatedManifest, _trust: &TrustScore) -> SandboxPolicy {
        SandboxPolicy {
            cpu_limit: 1,
            memory_limit_gb: 0.5,
            accelerators: Default::default(),
            network_policy: NetworkPolicy::EgressDeny,
            filesystem_policy: FilesystemPolicy::Ephemeral,
            max_trust_elevation: TrustElevation { cpu: 2, memory_gb: 1.0 },
            revision: 0,
        }
    }

    fn elevate(&self, current: &SandboxPolicy, request: &ElevationRequest) -> WardenResult<SandboxPolicy> {
        let budget = current.max_trust_elevation;
        if request.additional_cpu > budget.cpu || request.additional_memory_gb > budget.memory_gb {
            return Err(WardenError::ElevationRejected {
                reason: "over budget".to_string(),
            });
        }
        Ok(SandboxPolicy {
            cpu_limit: current.cpu_limit + request.additional_cpu,
            memory_limit_gb: current.memory_limit_gb + request.additional_memory_gb,
            max_trust_elevation: TrustElevation {
                cpu: budget.cpu - request.additional_cpu,
                memory_gb: budget.memory_gb - request.additional_memory_gb,
            },
            revision: current.revision + 1,
            ..current.clone()
        })
    }
}

/// Remembers the last memory state per agent and counts anchors.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    latest: Arc<Mutex<HashMap<AgentId, MemoryState>>>,
    count: Arc<Mutex<usize>>,
}

impl MemoryRegistry {
    pub fn anchored(&self) -> usize {
        *self.count.lock().unwrap()
    }
}

impl ManifestRegistry for MemoryRegistry {
    fn anchor(&self, manifest: &ValidatedManifest) -> WardenResult<String> {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.latest.lock().unwrap().insert(
            manifest.agent_id().clone(),
            manifest.manifest().memory_state.clone(),
        );
        Ok(format!("anchor-{count}"))
    }

    fn prior_memory(&self, agent_id: &AgentId) -> Option<MemoryState> {
        self.latest.lock().unwrap().get(agent_id).cloned()
    }
}

/// Labels claims by the first word of their text:
/// `verified …`, `outage …` (oracle error), `stall …` (never answers),
/// anything else is unverified.
pub struct ScriptedVerifier;

#[async_trait]
impl ClaimVerifier for ScriptedVerifier {
    async fn verify(&self, claim: &Claim) -> Result<VerificationResult, VerificationError> {
        let id = claim.claim_id.clone();
        match claim.text.split_whitespace().next() {
            Some("verified") => Ok(VerificationResult::verified(id, "kg://ref")),
            Some("outage") => Err(VerificationError::OracleUnavailable {
                claim_id: id,
                reason: "connection refused".to_string(),
            }),
            Some("stall") => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(VerificationResult::unverified(id, "late"))
            }
            _ => Ok(VerificationResult::unverified(id, "no citation")),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingLog {
    pub records: Arc<Mutex<Vec<ClaimRecord>>>,
    pub sealed: Arc<Mutex<Option<String>>>,
}

impl ClaimLogWriter for RecordingLog {
    fn append(&self, record: &ClaimRecord) -> WardenResult<u64> {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(records.len() as u64)
    }

    fn records(&self) -> Vec<ClaimRecord> {
        self.records.lock().unwrap().clone()
    }

    fn seal(&self, session_id: &str) -> WardenResult<()> {
        *self.sealed.lock().unwrap() = Some(session_id.to_string());
        Ok(())
    }
}

/// Reports counts only; scores are fixed at zero.
pub struct CountingAggregator;

impl MetricsAggregator for CountingAggregator {
    fn snapshot(&self, history: &SessionHistory<'_>) -> MetricsSnapshot {
        let mut labels = LabelTally::default();
        for record in history.claims {
            labels.record(record.result.label);
        }
        MetricsSnapshot {
            complexity: 0.0,
            novelty: 0.0,
            continuity: if history.prior_memory.is_some() { 0.5 } else { 1.0 },
            composite: 0.0,
            labels,
            message_count: history.messages.len(),
            claim_count: history.claims.len(),
            computed_at: Utc::now(),
        }
    }
}
