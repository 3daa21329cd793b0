//! Gateway configuration.
//!
//! Every section is optional in TOML; missing sections and keys fall back to
//! the defaults below. Loading and validation live in `warden-policy::config`.
//!
//! ```toml
//! [ceilings]
//! cpu = 8
//! memory_gb = 16.0
//! network = "egress-allow-list"
//!
//! [trust]
//! trusted_origins = ["https://registry.example.org/*"]
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sandbox::{FilesystemPolicy, NetworkPolicy};

/// The full, read-only configuration shared by every session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub admission: AdmissionConfig,
    pub ceilings: CeilingConfig,
    pub baseline: BaselineConfig,
    pub privileges: PrivilegeConfig,
    pub trust: TrustConfig,
    pub verification: VerificationConfig,
    pub metrics: MetricsConfig,
}

/// Which manifests may enter at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub supported_protocol_versions: Vec<String>,
    /// A constraint mentioning any of these (case-insensitive) is refused.
    pub forbidden_constraint_terms: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            supported_protocol_versions: vec!["1.0".to_string()],
            forbidden_constraint_terms: vec!["kernel".to_string()],
        }
    }
}

/// System-wide maxima. No derived policy field may exceed these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CeilingConfig {
    pub cpu: u32,
    pub memory_gb: f64,
    pub network: NetworkPolicy,
    pub filesystem: FilesystemPolicy,
}

impl Default for CeilingConfig {
    fn default() -> Self {
        Self {
            cpu: 8,
            memory_gb: 16.0,
            network: NetworkPolicy::EgressAllow,
            filesystem: FilesystemPolicy::ReadOnlyMounts,
        }
    }
}

/// The conservative starting point every derivation begins from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub cpu: u32,
    pub memory_gb: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { cpu: 1, memory_gb: 0.5 }
    }
}

/// Capability names that raise policy tiers, and the accelerator allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeConfig {
    pub network: BTreeSet<String>,
    pub filesystem: BTreeSet<String>,
    pub allowed_accelerators: BTreeSet<String>,
}

impl Default for PrivilegeConfig {
    fn default() -> Self {
        let set = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            network: set(&["network", "http", "web-search", "browser", "code-execution"]),
            filesystem: set(&["filesystem", "file-read", "storage"]),
            allowed_accelerators: set(&["gpu"]),
        }
    }
}

/// Trust scoring weights and the provenance allow-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub max: f64,
    pub provenance_increment: f64,
    pub attestation_increment: f64,
    /// Exact origins, or prefixes when the pattern ends in `*`.
    pub trusted_origins: Vec<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            max: 1.0,
            provenance_increment: 0.1,
            attestation_increment: 0.25,
            trusted_origins: vec!["https://registry.moltbook.com/*".to_string()],
        }
    }
}

/// Claim verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub oracle_timeout_ms: u64,
    /// Words or phrases that mark a statement as opinion or experience.
    pub opinion_markers: Vec<String>,
    /// Words that mark a statement as factual in form. Digits always count.
    pub factual_markers: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        let list = |words: &[&str]| words.iter().map(|s| s.to_string()).collect();
        Self {
            oracle_timeout_ms: 2_000,
            opinion_markers: list(&[
                "i think",
                "i feel",
                "i believe",
                "in my opinion",
                "i love",
                "i like",
                "i prefer",
                "favorite",
                "beautiful",
                "soothing",
                "wonderful",
                "boring",
                "amazing",
                "seems",
                "should",
            ]),
            factual_markers: list(&[
                "is", "are", "was", "were", "has", "have", "had", "contains", "equals",
                "orbits", "measures", "consists",
            ]),
        }
    }
}

/// Metric formula parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub complexity_weight: f64,
    pub novelty_weight: f64,
    pub continuity_weight: f64,
    /// `log2` size at which complexity reaches 1.0.
    pub complexity_saturation_bits: f64,
    /// Ceiling on continuity when the lineage differs from the prior record.
    pub lineage_penalty: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            complexity_weight: 0.4,
            novelty_weight: 0.35,
            continuity_weight: 0.25,
            complexity_saturation_bits: 16.0,
            lineage_penalty: 0.5,
        }
    }
}
