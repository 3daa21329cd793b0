//! Loading and validating `WardenConfig` from TOML.
//!
//! Every section of the file is optional. Validation runs after parsing and
//! reports every inconsistent value in one `ConfigError`.

use std::path::Path;

use tracing::debug;

use warden_contracts::{
    config::WardenConfig,
    error::{WardenError, WardenResult},
};

/// Parse `s` as TOML and validate the result.
///
/// Returns `WardenError::ConfigError` if the TOML is malformed, does not
/// match `WardenConfig`, or fails `validate`.
pub fn from_toml_str(s: &str) -> WardenResult<WardenConfig> {
    let config: WardenConfig = toml::from_str(s).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to parse warden TOML: {}", e),
    })?;
    validate(&config)?;
    debug!(
        cpu_ceiling = config.ceilings.cpu,
        memory_ceiling_gb = config.ceilings.memory_gb,
        network_ceiling = %config.ceilings.network,
        trusted_origins = config.trust.trusted_origins.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Read the file at `path` and parse it with `from_toml_str`.
pub fn from_file(path: &Path) -> WardenResult<WardenConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    from_toml_str(&contents)
}

/// Check cross-field consistency that serde cannot express.
pub fn validate(config: &WardenConfig) -> WardenResult<()> {
    let mut problems: Vec<String> = Vec::new();
    let mut check = |ok: bool, msg: &str| {
        if !ok {
            problems.push(msg.to_string());
        }
    };

    let ceilings = &config.ceilings;
    let baseline = &config.baseline;
    check(baseline.cpu >= 1, "baseline.cpu must be at least 1");
    check(baseline.cpu <= ceilings.cpu, "baseline.cpu exceeds ceilings.cpu");
    check(is_positive(baseline.memory_gb), "baseline.memory_gb must be a positive number");
    check(is_positive(ceilings.memory_gb), "ceilings.memory_gb must be a positive number");
    check(
        baseline.memory_gb <= ceilings.memory_gb,
        "baseline.memory_gb exceeds ceilings.memory_gb",
    );

    check(
        !config.admission.supported_protocol_versions.is_empty(),
        "admission.supported_protocol_versions must not be empty",
    );

    let trust = &config.trust;
    check(is_positive(trust.max), "trust.max must be a positive number");
    check(is_non_negative(trust.provenance_increment), "trust.provenance_increment must be >= 0");
    check(is_non_negative(trust.attestation_increment), "trust.attestation_increment must be >= 0");

    check(
        config.verification.oracle_timeout_ms > 0,
        "verification.oracle_timeout_ms must be greater than 0",
    );

    let metrics = &config.metrics;
    let weights = [metrics.complexity_weight, metrics.novelty_weight, metrics.continuity_weight];
    check(
        weights.iter().all(|w| is_non_negative(*w)),
        "metrics weights must be finite and >= 0",
    );
    check(weights.iter().sum::<f64>() > 0.0, "metrics weights must not all be zero");
    check(
        is_positive(metrics.complexity_saturation_bits),
        "metrics.complexity_saturation_bits must be a positive number",
    );
    check(
        (0.0..=1.0).contains(&metrics.lineage_penalty),
        "metrics.lineage_penalty must be within [0, 1]",
    );

    if problems.is_empty() {
        Ok(())
    } else {
        Err(WardenError::ConfigError {
            reason: problems.join("; "),
        })
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn is_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}
