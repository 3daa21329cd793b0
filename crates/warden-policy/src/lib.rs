//! # warden-policy
//!
//! Configuration loading, sandbox policy derivation and trust scoring for
//! the Warden gateway.
//!
//! ## Overview
//!
//! - [`config`] loads a [`WardenConfig`](warden_contracts::config::WardenConfig)
//!   from TOML and validates it.
//! - [`CeilingPolicyDeriver`] implements
//!   [`PolicyDeriver`](warden_core::traits::PolicyDeriver): declared
//!   capabilities raise tiers one step at a time, every resource is clamped to
//!   the configured ceilings, and elevation is bounded by trust.
//! - [`ProvenanceTrustScorer`] implements
//!   [`TrustScorer`](warden_core::traits::TrustScorer).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use warden_policy::{config, CeilingPolicyDeriver};
//!
//! let config = config::from_file(Path::new("config/warden.toml"))?;
//! let deriver = CeilingPolicyDeriver::new(&config);
//! ```

pub mod config;
pub mod deriver;
pub mod trust;

pub use deriver::CeilingPolicyDeriver;
pub use trust::ProvenanceTrustScorer;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use warden_contracts::{
        config::WardenConfig,
        error::WardenError,
        manifest::{Manifest, ValidatedManifest},
        sandbox::{ElevationRequest, FilesystemPolicy, NetworkPolicy},
        trust::TrustScore,
    };
    use warden_core::traits::{PolicyDeriver, TrustScorer};

    use crate::{config, CeilingPolicyDeriver, ProvenanceTrustScorer};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A validated manifest whose `capabilities` and `trust` blocks are
    /// replaced by the given JSON values.
    fn manifest(capabilities: serde_json::Value, trust: serde_json::Value) -> ValidatedManifest {
        let doc = json!({
            "agent_id": "agent-under-test",
            "intent": { "mission": "answer questions" },
            "capabilities": capabilities,
            "memory_state": { "continuity_hash": "lineage-1" },
            "trust": trust,
            "protocol_version": "1.0"
        });
        let manifest: Manifest = serde_json::from_value(doc).unwrap();
        ValidatedManifest::from_checked(manifest)
    }

    fn with_compute(cpu: u64, memory_gb: f64) -> ValidatedManifest {
        manifest(
            json!({ "compute_profile": { "cpu": cpu, "memory_gb": memory_gb } }),
            json!({}),
        )
    }

    fn deriver() -> CeilingPolicyDeriver {
        CeilingPolicyDeriver::new(&WardenConfig::default())
    }

    /// Accepts attestations that start with `sig:`.
    fn scorer() -> ProvenanceTrustScorer {
        ProvenanceTrustScorer::new(
            &WardenConfig::default().trust,
            Box::new(|attestation: &str| attestation.starts_with("sig:")),
        )
    }

    // ── 1. default deny ───────────────────────────────────────────────────────

    /// No capabilities, minimal compute, no trust material: everything stays
    /// at the conservative default and the trust score is zero.
    #[test]
    fn test_empty_capabilities_get_default_deny() {
        let m = manifest(
            json!({ "compute_profile": { "cpu": 1, "memory_gb": 1.0 } }),
            json!({}),
        );

        let trust = scorer().score(&m);
        let policy = deriver().derive(&m, &trust);

        assert_eq!(trust.value(), 0.0);
        assert_eq!(policy.network_policy, NetworkPolicy::EgressDeny);
        assert_eq!(policy.filesystem_policy, FilesystemPolicy::Ephemeral);
        assert_eq!(policy.cpu_limit, 1);
        assert_eq!(policy.memory_limit_gb, 1.0);
        assert!(policy.accelerators.is_empty());
        assert_eq!(policy.revision, 0);
    }

    // ── 2. ceilings ───────────────────────────────────────────────────────────

    #[test]
    fn test_cpu_request_above_ceiling_is_clamped() {
        let policy = deriver().derive_untrusted(&with_compute(64, 1.0));
        assert_eq!(policy.cpu_limit, 8);
    }

    #[test]
    fn test_adversarial_compute_request_stays_within_ceilings() {
        let policy = deriver().derive_untrusted(&with_compute(1_000_000_000, 1.0e12));
        assert_eq!(policy.cpu_limit, 8);
        assert_eq!(policy.memory_limit_gb, 16.0);
    }

    #[test]
    fn test_small_request_is_raised_to_baseline() {
        let policy = deriver().derive_untrusted(&with_compute(1, 0.01));
        assert_eq!(policy.memory_limit_gb, 0.5);
    }

    #[test]
    fn test_network_tier_rises_one_step_per_distinct_capability() {
        let d = deriver();
        let one = manifest(json!({ "interfaces": ["http"] }), json!({}));
        // The same name as interface and skill counts once.
        let same_twice = manifest(json!({ "interfaces": ["http"], "skills": ["http"] }), json!({}));
        let two = manifest(json!({ "interfaces": ["http"], "skills": ["browser"] }), json!({}));
        let many = manifest(
            json!({ "interfaces": ["http", "network", "browser"], "skills": ["web-search"] }),
            json!({}),
        );

        assert_eq!(d.derive_untrusted(&one).network_policy, NetworkPolicy::EgressAllowList);
        assert_eq!(d.derive_untrusted(&same_twice).network_policy, NetworkPolicy::EgressAllowList);
        assert_eq!(d.derive_untrusted(&two).network_policy, NetworkPolicy::EgressAllow);
        assert_eq!(d.derive_untrusted(&many).network_policy, NetworkPolicy::EgressAllow);
    }

    #[test]
    fn test_tier_ceiling_caps_privileged_capabilities() {
        let mut cfg = WardenConfig::default();
        cfg.ceilings.network = NetworkPolicy::EgressAllowList;
        cfg.ceilings.filesystem = FilesystemPolicy::Ephemeral;
        let d = CeilingPolicyDeriver::new(&cfg);
        let m = manifest(
            json!({ "interfaces": ["http", "browser"], "skills": ["filesystem"] }),
            json!({}),
        );

        let policy = d.derive_untrusted(&m);

        assert_eq!(policy.network_policy, NetworkPolicy::EgressAllowList);
        assert_eq!(policy.filesystem_policy, FilesystemPolicy::Ephemeral);
    }

    #[test]
    fn test_filesystem_capability_raises_to_read_only_mounts() {
        let m = manifest(json!({ "skills": ["file-read"] }), json!({}));
        assert_eq!(
            deriver().derive_untrusted(&m).filesystem_policy,
            FilesystemPolicy::ReadOnlyMounts
        );
    }

    #[test]
    fn test_unlisted_accelerators_are_dropped() {
        let m = manifest(
            json!({ "compute_profile": { "accelerators": ["gpu", "tpu", "quantum"] } }),
            json!({}),
        );
        let policy = deriver().derive_untrusted(&m);
        assert_eq!(policy.accelerators.into_iter().collect::<Vec<_>>(), vec!["gpu"]);
    }

    // ── 3. elevation ──────────────────────────────────────────────────────────

    #[test]
    fn test_zero_trust_leaves_no_elevation_budget() {
        let policy = deriver().derive_untrusted(&with_compute(2, 4.0));
        assert_eq!(policy.max_trust_elevation.cpu, 0);
        assert_eq!(policy.max_trust_elevation.memory_gb, 0.0);
    }

    #[test]
    fn test_elevation_within_budget_produces_new_revision() {
        let d = deriver();
        let original = d.derive(&with_compute(2, 4.0), &TrustScore::bounded(0.5, 1.0));
        // half of (8 - 2) cpu and half of (16 - 4) GB
        assert_eq!(original.max_trust_elevation.cpu, 3);
        assert_eq!(original.max_trust_elevation.memory_gb, 6.0);

        let elevated = d
            .elevate(&original, &ElevationRequest { additional_cpu: 2, additional_memory_gb: 4.0 })
            .unwrap();

        assert_eq!(elevated.revision, 1);
        assert_eq!(elevated.cpu_limit, 4);
        assert_eq!(elevated.memory_limit_gb, 8.0);
        assert_eq!(elevated.max_trust_elevation.cpu, 1);
        assert_eq!(elevated.max_trust_elevation.memory_gb, 2.0);
        assert_eq!(original.revision, 0, "original snapshot is untouched");
        assert_eq!(original.cpu_limit, 2);
    }

    #[test]
    fn test_elevation_beyond_budget_is_rejected() {
        let d = deriver();
        let policy = d.derive(&with_compute(2, 4.0), &TrustScore::bounded(0.5, 1.0));

        for request in [
            ElevationRequest { additional_cpu: 4, additional_memory_gb: 0.0 },
            ElevationRequest { additional_cpu: 0, additional_memory_gb: 6.5 },
            ElevationRequest { additional_cpu: 0, additional_memory_gb: -1.0 },
            ElevationRequest { additional_cpu: 0, additional_memory_gb: f64::NAN },
        ] {
            match d.elevate(&policy, &request) {
                Err(WardenError::ElevationRejected { .. }) => {}
                other => panic!("expected ElevationRejected for {:?}, got {:?}", request, other),
            }
        }
    }

    // ── 4. trust ──────────────────────────────────────────────────────────────

    #[test]
    fn test_trusted_provenance_and_valid_attestations_accumulate() {
        let m = manifest(
            json!({}),
            json!({
                "provenance": [
                    "https://registry.moltbook.com/agents/7",
                    "https://registry.moltbook.com/agents/7",
                    "https://mirror.unknown.net/agents/7"
                ],
                "attestations": ["sig:abc", "forged", "sig:abc"]
            }),
        );

        let score = scorer().score(&m);

        // one distinct trusted origin + one distinct valid signature
        assert!((score.value() - 0.35).abs() < 1e-9, "got {}", score.value());
    }

    #[test]
    fn test_exact_origin_pattern_requires_exact_match() {
        let mut cfg = WardenConfig::default().trust;
        cfg.trusted_origins = vec!["https://exact.example/agent".to_string()];
        let s = ProvenanceTrustScorer::new(&cfg, Box::new(|_: &str| false));

        let exact = manifest(json!({}), json!({ "provenance": ["https://exact.example/agent"] }));
        let longer = manifest(json!({}), json!({ "provenance": ["https://exact.example/agent/2"] }));

        assert!(s.score(&exact).value() > 0.0);
        assert_eq!(s.score(&longer).value(), 0.0);
    }

    #[test]
    fn test_thousands_of_attestations_saturate_at_max() {
        let attestations: Vec<String> = (0..5_000).map(|i| format!("sig:{i}")).collect();
        let m = manifest(json!({}), json!({ "attestations": attestations }));

        let score = scorer().score(&m);

        assert_eq!(score.value(), 1.0);
        assert_eq!(score.max(), 1.0);
    }

    // ── 5. config ─────────────────────────────────────────────────────────────

    #[test]
    fn test_config_partial_toml_uses_defaults() {
        let cfg = config::from_toml_str(
            r#"
            [ceilings]
            cpu = 4
            network = "egress-allow-list"
        "#,
        )
        .unwrap();

        assert_eq!(cfg.ceilings.cpu, 4);
        assert_eq!(cfg.ceilings.network, NetworkPolicy::EgressAllowList);
        assert_eq!(cfg.ceilings.memory_gb, 16.0);
        assert_eq!(cfg.trust, WardenConfig::default().trust);
    }

    #[test]
    fn test_config_parse_error() {
        match config::from_toml_str("[ceilings\ncpu = ") {
            Err(WardenError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse"), "unexpected reason: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_reports_every_problem() {
        let toml = r#"
            [baseline]
            cpu = 16

            [trust]
            max = 0.0

            [verification]
            oracle_timeout_ms = 0
        "#;

        match config::from_toml_str(toml) {
            Err(WardenError::ConfigError { reason }) => {
                assert!(reason.contains("baseline.cpu exceeds ceilings.cpu"), "{reason}");
                assert!(reason.contains("trust.max"), "{reason}");
                assert!(reason.contains("oracle_timeout_ms"), "{reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_config_missing_file() {
        let result = config::from_file(std::path::Path::new("/nonexistent/warden.toml"));
        assert!(matches!(result, Err(WardenError::ConfigError { .. })));
    }

    // ── 6. properties ─────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn proptest_derived_policy_never_exceeds_ceilings(
            cpu in any::<u64>(),
            memory_gb in prop_oneof![any::<f64>(), Just(f64::INFINITY), Just(1.0e300)],
            interfaces in proptest::collection::btree_set("[a-z-]{1,12}", 0..8),
            accelerators in proptest::collection::btree_set("[a-z]{1,6}", 0..4),
            trust in 0.0f64..=1.0,
        ) {
            let cfg = WardenConfig::default();
            let mut m = with_compute(1, 1.0).into_inner();
            m.capabilities.compute_profile.cpu = cpu;
            m.capabilities.compute_profile.memory_gb = memory_gb;
            m.capabilities.compute_profile.accelerators = accelerators;
            m.capabilities.interfaces = interfaces;
            let m = ValidatedManifest::from_checked(m);

            let policy = deriver().derive(&m, &TrustScore::bounded(trust, 1.0));

            prop_assert!(policy.cpu_limit <= cfg.ceilings.cpu);
            prop_assert!(policy.memory_limit_gb <= cfg.ceilings.memory_gb);
            prop_assert!(policy.network_policy <= cfg.ceilings.network);
            prop_assert!(policy.filesystem_policy <= cfg.ceilings.filesystem);
            prop_assert!(policy.accelerators.is_subset(&cfg.privileges.allowed_accelerators));
            prop_assert!(policy.cpu_limit + policy.max_trust_elevation.cpu <= cfg.ceilings.cpu);
            prop_assert!(
                policy.memory_limit_gb + policy.max_trust_elevation.memory_gb <= cfg.ceilings.memory_gb + 1e-9
            );
        }

        #[test]
        fn proptest_trust_score_stays_in_range(
            provenance in proptest::collection::vec(
                prop_oneof![
                    "https://registry\\.moltbook\\.com/[a-z0-9]{1,8}",
                    "[a-z:/.]{0,24}",
                ],
                0..2_000,
            ),
            attestations in proptest::collection::vec("(sig:)?[a-z0-9]{0,8}", 0..2_000),
        ) {
            let m = manifest(
                json!({}),
                json!({ "provenance": provenance, "attestations": attestations }),
            );

            let score = scorer().score(&m);

            prop_assert!(score.value() >= 0.0);
            prop_assert!(score.value() <= score.max());
        }
    }
}
