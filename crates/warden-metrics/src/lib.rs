//! # warden-metrics
//!
//! Behavioral metrics for Warden sessions. [`ThriveAggregator`] implements
//! [`MetricsAggregator`](warden_core::traits::MetricsAggregator) as a pure
//! function of the session history.

pub mod aggregator;

pub use aggregator::ThriveAggregator;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use warden_contracts::{
        claim::{AgentMessage, Claim, ClaimId, ClaimRecord, VerificationResult},
        config::MetricsConfig,
        manifest::MemoryState,
        session::SessionHistory,
    };
    use warden_core::traits::MetricsAggregator;

    use crate::ThriveAggregator;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn aggregator() -> ThriveAggregator {
        ThriveAggregator::new(&MetricsConfig::default())
    }

    fn message(content: &str) -> AgentMessage {
        AgentMessage {
            sender_id: "agent".to_string(),
            content: content.to_string(),
            claims: vec![],
        }
    }

    fn memory(hash: &str, summaries: &[&str]) -> MemoryState {
        MemoryState {
            continuity_hash: hash.to_string(),
            summaries: summaries.iter().map(|s| s.to_string()).collect(),
            attachments: vec![],
            extensions: Default::default(),
        }
    }

    fn history<'a>(
        messages: &'a [AgentMessage],
        claims: &'a [ClaimRecord],
        current: &'a MemoryState,
        prior: Option<&'a MemoryState>,
    ) -> SessionHistory<'a> {
        SessionHistory {
            messages,
            claims,
            memory: current,
            prior_memory: prior,
        }
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_history() {
        let current = memory("lineage", &[]);
        let snapshot = aggregator().snapshot(&history(&[], &[], &current, None));

        assert_eq!(snapshot.complexity, 0.0);
        assert_eq!(snapshot.novelty, 0.0);
        assert_eq!(snapshot.continuity, 1.0);
        // only the continuity weight contributes
        assert!((snapshot.composite - 0.25).abs() < 1e-12);
        assert_eq!(snapshot.message_count, 0);
        assert_eq!(snapshot.labels.total(), 0);
    }

    #[test]
    fn test_novelty_counts_distinct_tokens() {
        let a = aggregator();
        assert_eq!(a.novelty(&[message("Moon moon, MOON moon")]), 0.25);
        assert_eq!(a.novelty(&[message("one two"), message("three four")]), 1.0);
        assert_eq!(a.novelty(&[message("...")]), 0.0);
    }

    #[test]
    fn test_complexity_counts_cited_claims_and_saturates() {
        let a = aggregator();
        let plain = message("mars has two moons");
        let mut cited = plain.clone();
        cited.claims = vec![Claim::new(
            ClaimId::new("c-1"),
            "Mars has two moons.",
            vec!["kg://mars/moons".to_string()],
        )];

        assert!(a.complexity(&[cited]) > a.complexity(&[plain]));

        let huge = message(&"word ".repeat(100_000));
        assert_eq!(a.complexity(&[huge]), 1.0);
    }

    #[test]
    fn test_complexity_ignores_message_order() {
        let a = aggregator();
        let forward = [message("alpha beta"), message("gamma"), message("delta epsilon zeta")];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(a.complexity(&forward), a.complexity(&backward));
        assert_eq!(a.novelty(&forward), a.novelty(&backward));
    }

    #[test]
    fn test_continuity() {
        let a = aggregator();
        let current = memory("lineage-b", &["saw rings", "met moons"]);

        assert_eq!(a.continuity(&current, None), 1.0);
        assert_eq!(a.continuity(&current, Some(&memory("lineage-b", &[]))), 1.0);
        // different lineage: penalty 0.5 × jaccard 1/3
        let prior = memory("lineage-a", &["saw rings", "mapped craters"]);
        assert!((a.continuity(&current, Some(&prior)) - 0.5 / 3.0).abs() < 1e-12);
        assert_eq!(a.continuity(&memory("x", &[]), Some(&memory("y", &[]))), 0.0);
    }

    #[test]
    fn test_weights_are_normalized() {
        let config = MetricsConfig {
            complexity_weight: 0.0,
            novelty_weight: 2.0,
            continuity_weight: 2.0,
            ..MetricsConfig::default()
        };
        let current = memory("lineage", &[]);
        let messages = [message("a b c d")];

        let snapshot = ThriveAggregator::new(&config).snapshot(&history(&messages, &[], &current, None));

        // novelty 1.0 and continuity 1.0, each weighted one half
        assert!((snapshot.composite - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_labels_are_tallied_from_claim_log() {
        let record = |id: &str, result: VerificationResult| ClaimRecord {
            claim: Claim::new(ClaimId::new(id), "text", vec![]),
            result,
            recorded_at: Utc::now(),
        };
        let claims = [
            record("a", VerificationResult::verified(ClaimId::new("a"), "kg://x")),
            record("b", VerificationResult::subjective(ClaimId::new("b"), "opinion")),
            record("c", VerificationResult::subjective(ClaimId::new("c"), "opinion")),
            record("d", VerificationResult::hallucination(ClaimId::new("d"), "contradicted")),
        ];
        let current = memory("lineage", &[]);

        let snapshot = aggregator().snapshot(&history(&[], &claims, &current, None));

        assert_eq!(snapshot.claim_count, 4);
        assert_eq!(snapshot.labels.verified, 1);
        assert_eq!(snapshot.labels.subjective, 2);
        assert_eq!(snapshot.labels.hallucination, 1);
        assert_eq!(snapshot.labels.unverified, 0);
    }

    proptest! {
        /// Appending a message never lowers complexity, and every score
        /// stays in [0, 1].
        #[test]
        fn proptest_complexity_monotonic_and_bounded(
            contents in proptest::collection::vec(".{0,80}", 0..20),
            extra in ".{0,80}",
        ) {
            let a = aggregator();
            let mut messages: Vec<AgentMessage> = contents.iter().map(|c| message(c)).collect();
            let before = a.complexity(&messages);
            messages.push(message(&extra));
            let after = a.complexity(&messages);

            prop_assert!(after >= before);
            prop_assert!((0.0..=1.0).contains(&after));
            let novelty = a.novelty(&messages);
            prop_assert!((0.0..=1.0).contains(&novelty));
        }
    }
}
