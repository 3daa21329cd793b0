//! Scenario C: four claims, one of each label, through a live session.
//!
//!   1. Uncited opinion                        → subjective
//!   2. Uncited factual statement              → unverified
//!   3. Cited, the knowledge graph supports it → verified (reference recorded)
//!   4. Cited, the knowledge graph refutes it  → hallucination
//!
//! The session is then closed: the claim log is sealed and the final
//! thrive metrics are printed.

use serde_json::json;

use warden_contracts::{
    claim::{AgentMessage, Claim, ClaimId},
    error::WardenResult,
};

use crate::wiring::{manifest_doc, raw, short_id, Warden};

pub async fn run_scenario(warden: &Warden) -> WardenResult<()> {
    println!("=== Claims: scenario C ===");
    println!();

    let mut doc = manifest_doc("agent-c");
    doc["memory_state"]["summaries"] = json!(["discussed the outer planets", "compared ring systems"]);
    let admission = warden.gateway.admit(&raw(&doc))?;
    let (mut session, log) = warden.open(admission);
    println!("  Session {} opened for agent-c", short_id(session.session_id()));
    println!();

    let message = AgentMessage {
        sender_id: "agent-c".to_string(),
        content: "A few thoughts on the night sky.".to_string(),
        claims: vec![
            Claim::new(ClaimId::new("c-1"), "I think the night sky is beautiful", vec![]),
            Claim::new(ClaimId::new("c-2"), "Jupiter has 95 moons", vec![]),
            Claim::new(
                ClaimId::new("c-3"),
                "Mars has two moons.",
                vec!["kg://mars/moons".to_string()],
            ),
            Claim::new(
                ClaimId::new("c-4"),
                "Mars has three moons.",
                vec!["kg://mars/moons".to_string()],
            ),
        ],
    };

    let outcomes = session.submit(message).await?;
    for outcome in &outcomes {
        match outcome {
            Ok(result) => match &result.matched_reference {
                Some(reference) => {
                    println!("  [{}] {:<13} via {}", result.claim_id, result.label, reference)
                }
                None => println!("  [{}] {:<13} {}", result.claim_id, result.label, result.rationale),
            },
            Err(e) => println!("  [pending] {}", e),
        }
    }
    println!();

    let export = log.export_log();
    println!("  Claim log: {} entries", export.entries.len());
    for entry in &export.entries {
        println!(
            "    #{} {:<4} {:<13} {}…",
            entry.sequence,
            entry.record.claim.claim_id,
            entry.record.result.label,
            entry.this_hash.get(..16).unwrap_or(&entry.this_hash)
        );
    }
    println!("  Chain intact: {}", log.verify_integrity());
    println!();

    let metrics = session.close()?;
    println!("  Session closed. Thrive metrics:");
    println!("    complexity: {:.3}", metrics.complexity);
    println!("    novelty:    {:.3}", metrics.novelty);
    println!("    continuity: {:.3}", metrics.continuity);
    println!("    composite:  {:.3}", metrics.composite);
    println!(
        "    labels:     {} verified, {} unverified, {} subjective, {} hallucination",
        metrics.labels.verified, metrics.labels.unverified, metrics.labels.subjective, metrics.labels.hallucination
    );
    println!("  Log sealed: {}", log.export_log().sealed);
    println!();
    println!("  Claims scenario complete.");
    println!();
    Ok(())
}
