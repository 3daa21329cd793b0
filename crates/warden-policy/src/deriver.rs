//! Ceiling-bounded sandbox policy derivation.
//!
//! Derivation algorithm:
//!
//! 1. Start from the conservative default: `egress-deny`, `ephemeral`, and
//!    the configured baseline cpu/memory.
//! 2. Each distinct declared interface or skill in the network-privileged set
//!    raises the network tier one step. Any filesystem-privileged name raises
//!    the filesystem tier to `read-only-mounts`.
//! 3. Requested cpu/memory are clamped into `[baseline, ceiling]`.
//! 4. Accelerators not on the allow-list are dropped.
//! 5. Every tier and limit is finally capped at its ceiling, which wins over
//!    the baseline if the two disagree.
//!
//! Nothing in the manifest can push a policy field above its ceiling, and no
//! out-of-range request is an error: it is clamped.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use warden_contracts::{
    config::{BaselineConfig, CeilingConfig, PrivilegeConfig, WardenConfig},
    error::{WardenError, WardenResult},
    manifest::{Capabilities, ValidatedManifest},
    sandbox::{ElevationRequest, FilesystemPolicy, NetworkPolicy, SandboxPolicy, TrustElevation},
    trust::TrustScore,
};
use warden_core::traits::PolicyDeriver;

/// A `PolicyDeriver` that maps declared capabilities onto tiers and clamps
/// every resource to the configured ceilings.
#[derive(Debug, Clone)]
pub struct CeilingPolicyDeriver {
    ceilings: CeilingConfig,
    baseline: BaselineConfig,
    privileges: PrivilegeConfig,
}

impl CeilingPolicyDeriver {
    pub fn new(config: &WardenConfig) -> Self {
        Self {
            ceilings: config.ceilings.clone(),
            baseline: config.baseline.clone(),
            privileges: config.privileges.clone(),
        }
    }

    /// Derive with no trust at all: the policy an unknown agent gets.
    pub fn derive_untrusted(&self, manifest: &ValidatedManifest) -> SandboxPolicy {
        self.derive(manifest, &TrustScore::zero())
    }

    fn network_tier(&self, capabilities: &Capabilities) -> NetworkPolicy {
        let privileged: BTreeSet<&str> = capabilities
            .declared()
            .filter(|name| self.privileges.network.contains(*name))
            .collect();
        NetworkPolicy::EgressDeny
            .raised_by(privileged.len())
            .min(self.ceilings.network)
    }

    fn filesystem_tier(&self, capabilities: &Capabilities) -> FilesystemPolicy {
        let raised = capabilities
            .declared()
            .any(|name| self.privileges.filesystem.contains(name));
        let tier = if raised {
            FilesystemPolicy::ReadOnlyMounts
        } else {
            FilesystemPolicy::Ephemeral
        };
        tier.min(self.ceilings.filesystem)
    }

    fn clamp_cpu(&self, requested: u64) -> u32 {
        let ceiling = u64::from(self.ceilings.cpu);
        let clamped = requested.max(u64::from(self.baseline.cpu)).min(ceiling);
        // `clamped <= ceiling`, which came from a u32.
        u32::try_from(clamped).unwrap_or(self.ceilings.cpu)
    }

    fn clamp_memory(&self, requested: f64) -> f64 {
        let ceiling = self.ceiling_memory();
        if !requested.is_finite() {
            return ceiling;
        }
        requested.max(self.baseline.memory_gb).min(ceiling)
    }

    /// The memory ceiling, treating a broken value as zero.
    fn ceiling_memory(&self) -> f64 {
        if self.ceilings.memory_gb.is_finite() {
            self.ceilings.memory_gb.max(0.0)
        } else {
            0.0
        }
    }

    fn elevation_budget(&self, cpu_limit: u32, memory_limit_gb: f64, trust: &TrustScore) -> TrustElevation {
        let fraction = trust.fraction();
        let cpu_headroom = f64::from(self.ceilings.cpu.saturating_sub(cpu_limit));
        let memory_headroom = (self.ceiling_memory() - memory_limit_gb).max(0.0);
        TrustElevation {
            cpu: (fraction * cpu_headroom).floor() as u32,
            memory_gb: fraction * memory_headroom,
        }
    }
}

impl PolicyDeriver for CeilingPolicyDeriver {
    fn derive(&self, manifest: &ValidatedManifest, trust: &TrustScore) -> SandboxPolicy {
        let capabilities = &manifest.manifest().capabilities;
        let profile = &capabilities.compute_profile;

        let cpu_limit = self.clamp_cpu(profile.cpu);
        let memory_limit_gb = self.clamp_memory(profile.memory_gb);

        let (accelerators, dropped): (BTreeSet<String>, BTreeSet<String>) = profile
            .accelerators
            .iter()
            .cloned()
            .partition(|kind| self.privileges.allowed_accelerators.contains(kind));
        if !dropped.is_empty() {
            warn!(
                agent_id = %manifest.agent_id(),
                dropped = ?dropped,
                "accelerators not on the allow-list were dropped"
            );
        }

        let policy = SandboxPolicy {
            cpu_limit,
            memory_limit_gb,
            accelerators,
            network_policy: self.network_tier(capabilities),
            filesystem_policy: self.filesystem_tier(capabilities),
            max_trust_elevation: self.elevation_budget(cpu_limit, memory_limit_gb, trust),
            revision: 0,
        };

        debug!(
            agent_id = %manifest.agent_id(),
            requested_cpu = profile.cpu,
            requested_memory_gb = profile.memory_gb,
            cpu_limit = policy.cpu_limit,
            memory_limit_gb = policy.memory_limit_gb,
            network = %policy.network_policy,
            filesystem = %policy.filesystem_policy,
            "policy derived"
        );
        policy
    }

    fn elevate(&self, current: &SandboxPolicy, request: &ElevationRequest) -> WardenResult<SandboxPolicy> {
        let budget = current.max_trust_elevation;
        let add_memory = request.additional_memory_gb;

        if !add_memory.is_finite() || add_memory < 0.0 {
            return Err(WardenError::ElevationRejected {
                reason: format!("additional memory must be a finite, non-negative number, got {add_memory}"),
            });
        }
        if request.additional_cpu > budget.cpu {
            return Err(WardenError::ElevationRejected {
                reason: format!(
                    "requested {} additional cpu but only {} may still be granted",
                    request.additional_cpu, budget.cpu
                ),
            });
        }
        if add_memory > budget.memory_gb {
            return Err(WardenError::ElevationRejected {
                reason: format!(
                    "requested {add_memory} GB additional memory but only {} GB may still be granted",
                    budget.memory_gb
                ),
            });
        }

        let cpu_limit = current.cpu_limit.saturating_add(request.additional_cpu);
        let memory_limit_gb = current.memory_limit_gb + add_memory;
        if cpu_limit > self.ceilings.cpu || memory_limit_gb > self.ceiling_memory() {
            return Err(WardenError::ElevationRejected {
                reason: "elevation would exceed the configured ceilings".to_string(),
            });
        }

        Ok(SandboxPolicy {
            cpu_limit,
            memory_limit_gb,
            max_trust_elevation: TrustElevation {
                cpu: budget.cpu - request.additional_cpu,
                memory_gb: (budget.memory_gb - add_memory).max(0.0),
            },
            revision: current.revision.saturating_add(1),
            ..current.clone()
        })
    }
}
