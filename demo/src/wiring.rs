//! Builds a complete Warden stack from one configuration.

use std::sync::Arc;

use serde_json::{json, Value};

use warden_audit::{InMemoryClaimLog, ManifestAnchor};
use warden_contracts::{
    config::WardenConfig,
    error::WardenResult,
    manifest::RawManifest,
    session::SessionId,
};
use warden_core::{Admission, Gateway, Session, SessionServices};
use warden_metrics::ThriveAggregator;
use warden_policy::{CeilingPolicyDeriver, ProvenanceTrustScorer};
use warden_verify::{GraphClaimVerifier, InMemoryKnowledgeGraph, ManifestSchemaValidator, MarkerClassifier};

/// Attestations signed by the demo registry key look like `sig:moltbook:<id>`.
const DEMO_SIGNATURE_PREFIX: &str = "sig:moltbook:";

/// Everything a scenario needs, with inspectable handles kept alongside the
/// boxed components the gateway owns.
pub struct Warden {
    pub gateway: Gateway,
    pub services: SessionServices,
    pub anchor: ManifestAnchor,
    pub graph: Arc<InMemoryKnowledgeGraph>,
}

impl Warden {
    pub fn build(config: &WardenConfig) -> WardenResult<Self> {
        let deriver = Arc::new(CeilingPolicyDeriver::new(config));
        let scorer = ProvenanceTrustScorer::new(
            &config.trust,
            Box::new(|attestation: &str| attestation.starts_with(DEMO_SIGNATURE_PREFIX)),
        );
        let anchor = ManifestAnchor::new();

        let gateway = Gateway::new(
            Box::new(ManifestSchemaValidator::new(&config.admission)?),
            Box::new(scorer),
            deriver,
            &config.admission,
        )
        .with_registry(Box::new(anchor.clone()));

        let graph = Arc::new(seeded_graph());
        let verifier = GraphClaimVerifier::new(
            graph.clone(),
            Box::new(MarkerClassifier::new(&config.verification)),
            &config.verification,
        );

        let services = SessionServices {
            verifier: Arc::new(verifier),
            deriver: gateway.deriver(),
            aggregator: Arc::new(ThriveAggregator::new(&config.metrics)),
        };

        Ok(Self {
            gateway,
            services,
            anchor,
            graph,
        })
    }

    /// Open a session for an admission, returning a log handle the caller
    /// can inspect after the session takes ownership of its clone.
    pub fn open(&self, admission: Admission) -> (Session, InMemoryClaimLog) {
        let log = InMemoryClaimLog::new(admission.assignment.session_id.to_string());
        let session = Session::open(admission, self.services.clone(), Box::new(log.clone()));
        (session, log)
    }
}

fn seeded_graph() -> InMemoryKnowledgeGraph {
    let graph = InMemoryKnowledgeGraph::new();
    graph
        .add_fact("kg://mars/moons", "Mars has two moons.")
        .add_refutation("kg://mars/moons", "Mars has three moons.")
        .add_fact("kg://saturn/rings", "Saturn has rings made mostly of ice.")
        .add_fact("kg://water/boiling", "Water boils at 100 degrees Celsius at sea level.");
    graph
}

// ── Manifest builders ─────────────────────────────────────────────────────────

/// A minimal valid manifest document for `agent_id`.
pub fn manifest_doc(agent_id: &str) -> Value {
    json!({
        "agent_id": agent_id,
        "intent": { "mission": "answer astronomy questions" },
        "capabilities": {},
        "memory_state": { "continuity_hash": format!("lineage-{agent_id}") },
        "protocol_version": "1.0"
    })
}

pub fn raw(doc: &Value) -> RawManifest {
    RawManifest::json(doc.to_string())
}

pub fn short_id(session_id: &SessionId) -> String {
    session_id.to_string().chars().take(8).collect()
}
