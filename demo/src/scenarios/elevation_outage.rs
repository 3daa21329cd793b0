//! Trust-gated elevation, an oracle outage, and re-admission continuity.
//!
//!   1. A manifest with trusted provenance and a signed attestation earns an
//!      elevation budget; one request fits, a larger one is rejected
//!   2. The knowledge graph goes offline: the cited claim stays pending and
//!      nothing is written to the log
//!   3. The graph comes back and the same claim is resubmitted; the log grows
//!   4. The agent returns under a new lineage and continuity drops
//!   5. The anchored manifest is retrieved and checked

use serde_json::json;

use warden_audit::AnchorStatus;
use warden_contracts::{
    claim::{AgentMessage, Claim, ClaimId},
    error::{WardenError, WardenResult},
    sandbox::ElevationRequest,
};

use crate::wiring::{manifest_doc, raw, Warden};

fn trusted_doc(lineage: &str) -> serde_json::Value {
    let mut doc = manifest_doc("agent-t");
    doc["capabilities"] = json!({
        "interfaces": ["http"],
        "skills": ["orbital mechanics"],
        "compute_profile": { "cpu": 2, "memory_gb": 4 }
    });
    doc["memory_state"] = json!({
        "continuity_hash": lineage,
        "summaries": ["catalogued the moons of Mars"]
    });
    doc["trust"] = json!({
        "provenance": ["https://registry.moltbook.com/agents/agent-t"],
        "attestations": ["sig:moltbook:agent-t", "sig:moltbook:agent-t-build", "unsigned-claim"]
    });
    doc
}

fn cited_message() -> AgentMessage {
    AgentMessage {
        sender_id: "agent-t".to_string(),
        content: "Checking a reference.".to_string(),
        claims: vec![Claim::new(
            ClaimId::generate(),
            "Saturn has rings made mostly of ice",
            vec!["kg://saturn/rings".to_string()],
        )],
    }
}

pub async fn run_scenario(warden: &Warden) -> WardenResult<()> {
    println!("=== Elevation, outage and continuity ===");
    println!();

    // ── Step 1: elevation ─────────────────────────────────────────────────────

    let admission = warden.gateway.admit(&raw(&trusted_doc("lineage-t-1")))?;
    let integrity_hash = admission.assignment.integrity_hash.clone();
    let (mut session, log) = warden.open(admission);

    let policy = session.policy();
    println!("  [1] trust score: {}", session.trust_score());
    println!(
        "      derived:   cpu {} / {} GB, budget +{} cpu / +{:.2} GB",
        policy.cpu_limit,
        policy.memory_limit_gb,
        policy.max_trust_elevation.cpu,
        policy.max_trust_elevation.memory_gb
    );

    let granted = session.request_elevation(ElevationRequest {
        additional_cpu: 1,
        additional_memory_gb: 1.0,
    })?;
    println!(
        "      granted:   cpu {} / {} GB (revision {})",
        granted.cpu_limit, granted.memory_limit_gb, granted.revision
    );

    match session.request_elevation(ElevationRequest {
        additional_cpu: 32,
        additional_memory_gb: 0.0,
    }) {
        Err(e @ WardenError::ElevationRejected { .. }) => println!("      rejected:  {}", e),
        other => println!("      rejected:  unexpected outcome: {:?}", other),
    }
    println!("      policy revisions kept: {}", session.policy_history().count());
    println!();

    // ── Step 2: outage ────────────────────────────────────────────────────────

    warden.graph.take_offline();
    let outcomes = session.submit(cited_message()).await?;
    for outcome in &outcomes {
        match outcome {
            Ok(result) => println!("  [2] unexpected label: {}", result.label),
            Err(e) => println!("  [2] pending (retryable = {}): {}", e.is_retryable(), e),
        }
    }
    println!("      log entries: {}", log.len());

    // ── Step 3: recovery ──────────────────────────────────────────────────────

    warden.graph.bring_online();
    let outcomes = session.submit(cited_message()).await?;
    for result in outcomes.iter().flatten() {
        println!("  [3] {} after resubmission", result.label);
    }
    println!("      log entries: {}, chain intact: {}", log.len(), log.verify_integrity());

    let first = session.close()?;
    println!("      continuity on first visit: {:.3}", first.continuity);
    println!();

    // ── Step 4: re-admission under a new lineage ──────────────────────────────

    let admission = warden.gateway.admit(&raw(&trusted_doc("lineage-t-2")))?;
    let prior = admission
        .prior_memory
        .as_ref()
        .map(|m| m.continuity_hash.clone())
        .unwrap_or_default();
    let (session, _log) = warden.open(admission);
    let second = session.close()?;
    println!("  [4] prior lineage: {}", prior);
    println!("      continuity on return:     {:.3}", second.continuity);
    println!();

    // ── Step 5: anchor check ──────────────────────────────────────────────────

    match integrity_hash.as_deref().and_then(|hash| warden.anchor.retrieve(hash)) {
        Some(report) => {
            let status = match report.status {
                AnchorStatus::Intact => "intact",
                AnchorStatus::Corrupted => "corrupted",
            };
            println!("  [5] anchor {}… is {}", report.recalculated_hash.get(..16).unwrap_or(&report.recalculated_hash), status);
        }
        None => println!("  [5] first anchor not found"),
    }
    println!("      anchored manifests: {}", warden.anchor.len());
    println!();
    println!("  Elevation and outage scenario complete.");
    println!();
    Ok(())
}
