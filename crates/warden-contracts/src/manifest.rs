//! Agent manifest types.
//!
//! A `Manifest` is the untrusted declaration an agent submits to request a
//! session. The gateway never hands a bare `Manifest` to the policy deriver or
//! trust scorer; only a `ValidatedManifest` produced by a `ManifestValidator`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stable identifier an agent declares for itself.
///
/// Must be non-empty and unique among active sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two serializations a manifest may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestFormat::Json => f.write_str("json"),
            ManifestFormat::Toml => f.write_str("toml"),
        }
    }
}

/// A manifest exactly as submitted, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    pub format: ManifestFormat,
    pub text: String,
}

impl RawManifest {
    pub fn json(text: impl Into<String>) -> Self {
        Self { format: ManifestFormat::Json, text: text.into() }
    }

    pub fn toml(text: impl Into<String>) -> Self {
        Self { format: ManifestFormat::Toml, text: text.into() }
    }
}

/// What the agent says it is for, plus the limits it imposes on itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub mission: String,
    /// Self-imposed constraints, in declaration order.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Unknown keys in this section, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Requested compute resources. These are requests, never entitlements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeProfile {
    /// Requested CPU count. Integral values beyond `u64::MAX` saturate.
    #[serde(default = "default_cpu", deserialize_with = "saturating_u64")]
    pub cpu: u64,
    #[serde(default = "default_memory_gb")]
    pub memory_gb: f64,
    #[serde(default)]
    pub accelerators: BTreeSet<String>,
    /// Unknown keys in this section, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

fn default_cpu() -> u64 {
    1
}

fn default_memory_gb() -> f64 {
    1.0
}

impl Default for ComputeProfile {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory_gb: default_memory_gb(),
            accelerators: BTreeSet::new(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Accept any non-negative integral JSON number, saturating at `u64::MAX`.
///
/// `1e20` is a valid JSON integer as far as the schema is concerned but does
/// not fit a `u64`; clamping happens later, so saturation loses nothing.
fn saturating_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Number(number) = &value else {
        return Err(D::Error::custom(format!("expected an integer, found {value}")));
    };
    if let Some(v) = number.as_u64() {
        return Ok(v);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(D::Error::custom(format!(
            "expected a non-negative integer, found {number}"
        ))),
    }
}

/// Declared interfaces, skills and compute profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub interfaces: BTreeSet<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub compute_profile: ComputeProfile,
    /// Unknown keys in this section, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Capabilities {
    /// Every declared interface and skill name, interfaces first.
    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.interfaces
            .iter()
            .chain(self.skills.iter())
            .map(String::as_str)
    }
}

/// Continuity information carried between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Lineage identifier; identical values mean the same continuous agent.
    pub continuity_hash: String,
    #[serde(default)]
    pub summaries: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Unknown keys in this section, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Provenance and attestations offered in support of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrustDeclaration {
    /// Source URIs, in declaration order.
    #[serde(default)]
    pub provenance: Vec<String>,
    /// Opaque signature strings, in declaration order.
    #[serde(default)]
    pub attestations: Vec<String>,
    /// Unknown keys in this section, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// A parsed agent manifest.
///
/// Unknown fields land in the `extensions` map of the section they appear
/// in, so newer agents can talk to older gateways. Nothing in the gateway
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub intent: Intent,
    pub capabilities: Capabilities,
    pub memory_state: MemoryState,
    #[serde(default)]
    pub trust: TrustDeclaration,
    pub protocol_version: String,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// A manifest that has passed schema validation.
///
/// Downstream components take this type rather than `Manifest` so an
/// unchecked document cannot reach policy derivation by accident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedManifest(Manifest);

impl ValidatedManifest {
    /// Wrap a manifest that a `ManifestValidator` implementation has checked.
    ///
    /// Validator implementations are the only intended callers.
    pub fn from_checked(manifest: Manifest) -> Self {
        Self(manifest)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.0
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.0.agent_id
    }

    /// The name to show for this agent: `display_name`, else `agent_id`.
    pub fn display_name(&self) -> &str {
        self.0.display_name.as_deref().unwrap_or(self.0.agent_id.as_str())
    }

    pub fn into_inner(self) -> Manifest {
        self.0
    }
}
