//! Sandbox policy types.
//!
//! A `SandboxPolicy` is what the gateway hands to the sandbox runtime. It is
//! derived once per session and never mutated; an approved elevation produces
//! a new snapshot with a higher `revision`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outbound network posture, ordered from most to least restrictive.
///
/// The derived `Ord` follows declaration order, so `EgressDeny` is the
/// smallest value and tier arithmetic can use `min`/`max` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkPolicy {
    EgressDeny,
    EgressAllowList,
    EgressAllow,
}

impl NetworkPolicy {
    const TIERS: [NetworkPolicy; 3] = [
        NetworkPolicy::EgressDeny,
        NetworkPolicy::EgressAllowList,
        NetworkPolicy::EgressAllow,
    ];

    /// Move `steps` tiers up the scale, stopping at `EgressAllow`.
    pub fn raised_by(self, steps: usize) -> Self {
        let index = (self as usize).saturating_add(steps).min(Self::TIERS.len() - 1);
        Self::TIERS[index]
    }
}

impl fmt::Display for NetworkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkPolicy::EgressDeny => f.write_str("egress-deny"),
            NetworkPolicy::EgressAllowList => f.write_str("egress-allow-list"),
            NetworkPolicy::EgressAllow => f.write_str("egress-allow"),
        }
    }
}

/// Filesystem posture, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilesystemPolicy {
    None,
    Ephemeral,
    ReadOnlyMounts,
}

impl fmt::Display for FilesystemPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilesystemPolicy::None => f.write_str("none"),
            FilesystemPolicy::Ephemeral => f.write_str("ephemeral"),
            FilesystemPolicy::ReadOnlyMounts => f.write_str("read-only-mounts"),
        }
    }
}

/// Additional resources that may still be granted after assignment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrustElevation {
    pub cpu: u32,
    pub memory_gb: f64,
}

/// The immutable resource envelope assigned to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    pub cpu_limit: u32,
    pub memory_limit_gb: f64,
    /// Accelerator kinds that survived the allow-list.
    pub accelerators: BTreeSet<String>,
    pub network_policy: NetworkPolicy,
    pub filesystem_policy: FilesystemPolicy,
    /// Upper bound on what an elevation request may still add.
    pub max_trust_elevation: TrustElevation,
    /// 0 for the derived policy, incremented by each granted elevation.
    pub revision: u32,
}

/// A request for more resources on top of the current policy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRequest {
    pub additional_cpu: u32,
    pub additional_memory_gb: f64,
}
