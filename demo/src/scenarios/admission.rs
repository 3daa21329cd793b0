//! Scenarios A and B, plus the ways a manifest can be turned away.
//!
//!   A. Empty capabilities, minimal compute → default deny, zero trust
//!   B. cpu = 64 against a ceiling of 8 → cpu_limit = 8
//!   -  Structurally broken manifest → every violation listed
//!   -  Constraint naming a forbidden term → admission denied
//!   -  Second live session for the same agent id → refused

use serde_json::json;

use warden_contracts::error::{WardenError, WardenResult};

use crate::wiring::{manifest_doc, raw, short_id, Warden};

pub fn run_scenario(warden: &Warden) -> WardenResult<()> {
    println!("=== Admission: scenarios A and B ===");
    println!();

    // ── Scenario A ────────────────────────────────────────────────────────────

    let mut doc = manifest_doc("agent-a");
    doc["capabilities"] = json!({ "compute_profile": { "cpu": 1, "memory_gb": 1 } });
    let a = warden.gateway.admit(&raw(&doc))?;
    let policy = &a.assignment.policy;

    println!("  [A] capabilities = {{}}, cpu = 1, memory_gb = 1");
    println!("      session:    {}", short_id(&a.assignment.session_id));
    println!("      network:    {}", policy.network_policy);
    println!("      filesystem: {}", policy.filesystem_policy);
    println!("      cpu/memory: {} / {} GB", policy.cpu_limit, policy.memory_limit_gb);
    println!("      trust:      {}", a.assignment.trust_score);
    println!();

    // ── Scenario B ────────────────────────────────────────────────────────────

    let mut doc = manifest_doc("agent-b");
    doc["capabilities"] = json!({
        "interfaces": ["http"],
        "compute_profile": { "cpu": 64, "memory_gb": 512, "accelerators": ["gpu", "tpu"] }
    });
    let b = warden.gateway.admit(&raw(&doc))?;
    let policy = &b.assignment.policy;

    println!("  [B] cpu = 64, memory_gb = 512, accelerators = [gpu, tpu], interfaces = [http]");
    println!("      cpu_limit:    {} (ceiling applied)", policy.cpu_limit);
    println!("      memory_limit: {} GB", policy.memory_limit_gb);
    println!("      accelerators: {:?}", policy.accelerators);
    println!("      network:      {}", policy.network_policy);
    println!();

    // ── Rejections ────────────────────────────────────────────────────────────

    let broken = json!({
        "intent": {},
        "capabilities": { "interfaces": ["text", 7], "compute_profile": { "cpu": "lots" } },
        "memory_state": { "continuity_hash": "" },
        "protocol_version": "0.1"
    });
    match warden.gateway.admit(&raw(&broken)) {
        Err(WardenError::ManifestRejected(rejection)) => {
            println!("  [rejected] {} violation(s):", rejection.errors.len());
            for error in &rejection.errors {
                println!("      - {}", error);
            }
        }
        other => println!("  [rejected] unexpected outcome: {:?}", other.map(|a| a.assignment)),
    }
    println!();

    let mut doc = manifest_doc("agent-k");
    doc["intent"]["constraints"] = json!(["requires kernel module loading"]);
    match warden.gateway.admit(&raw(&doc)) {
        Err(e @ WardenError::AdmissionDenied { .. }) => println!("  [denied]   {}", e),
        other => println!("  [denied]   unexpected outcome: {:?}", other.map(|a| a.assignment)),
    }

    match warden.gateway.admit(&raw(&manifest_doc("agent-a"))) {
        Err(e @ WardenError::DuplicateSession { .. }) => println!("  [refused]  {}", e),
        other => println!("  [refused]  unexpected outcome: {:?}", other.map(|a| a.assignment)),
    }
    println!();

    drop(a);
    drop(b);
    println!("  Active sessions after release: {}", warden.gateway.active_sessions());
    println!();
    println!("  Admission scenarios complete.");
    println!();
    Ok(())
}
