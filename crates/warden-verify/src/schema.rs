//! Manifest schema validation.
//!
//! `ManifestSchemaValidator` implements the `ManifestValidator` trait from
//! `warden-core`. Validation runs in two phases over the parsed document:
//!
//! 1. **Structural**: the document is validated against an embedded JSON
//!    Schema with the `jsonschema` crate. `required` violations become
//!    `MissingField`, `type` violations become `TypeMismatch`.
//! 2. **Semantic**: non-blank identifiers, positive compute requests and a
//!    supported protocol version.
//!
//! Both phases always run and every violation is collected, sorted by field
//! path, so a submitter sees the whole problem set in one round trip. A
//! document that cannot be parsed at all yields a single `Malformed` error.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use serde_json::{json, Value};
use tracing::{debug, warn};

use warden_contracts::{
    config::AdmissionConfig,
    error::{ManifestRejection, ValidationError, WardenError, WardenResult},
    manifest::{Manifest, ManifestFormat, RawManifest, ValidatedManifest},
};
use warden_core::traits::ManifestValidator;

/// Field path used for errors that concern the whole document.
const DOCUMENT: &str = "<document>";

/// The structural schema every manifest must satisfy.
///
/// Unknown properties are allowed; they end up in `Manifest::extensions`.
fn manifest_schema() -> Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "required": ["agent_id", "intent", "capabilities", "memory_state", "protocol_version"],
        "properties": {
            "agent_id": { "type": "string" },
            "display_name": { "type": "string" },
            "intent": {
                "type": "object",
                "required": ["mission"],
                "properties": {
                    "mission": { "type": "string" },
                    "constraints": strings
                }
            },
            "capabilities": {
                "type": "object",
                "properties": {
                    "interfaces": strings,
                    "skills": strings,
                    "compute_profile": {
                        "type": "object",
                        "properties": {
                            "cpu": { "type": "integer" },
                            "memory_gb": { "type": "number" },
                            "accelerators": strings
                        }
                    }
                }
            },
            "memory_state": {
                "type": "object",
                "required": ["continuity_hash"],
                "properties": {
                    "continuity_hash": { "type": "string" },
                    "summaries": strings,
                    "attachments": strings
                }
            },
            "trust": {
                "type": "object",
                "properties": {
                    "provenance": strings,
                    "attestations": strings
                }
            },
            "protocol_version": { "type": "string" }
        }
    })
}

/// The Warden manifest validator.
pub struct ManifestSchemaValidator {
    validator: jsonschema::Validator,
    supported_versions: Vec<String>,
}

impl ManifestSchemaValidator {
    /// Compile the embedded schema.
    ///
    /// Returns `WardenError::ConfigError` if the schema fails to compile.
    pub fn new(admission: &AdmissionConfig) -> WardenResult<Self> {
        let validator = jsonschema::validator_for(&manifest_schema()).map_err(|e| WardenError::ConfigError {
            reason: format!("manifest schema failed to compile: {e}"),
        })?;
        Ok(Self {
            validator,
            supported_versions: admission.supported_protocol_versions.clone(),
        })
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn parse(raw: &RawManifest) -> Result<Value, ValidationError> {
        let parsed = match raw.format {
            ManifestFormat::Json => serde_json::from_str::<Value>(&raw.text).map_err(|e| e.to_string()),
            ManifestFormat::Toml => toml::from_str::<Value>(&raw.text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| ValidationError::Malformed {
            format: raw.format,
            reason,
        })
    }

    fn structural_errors(&self, doc: &Value) -> Vec<ValidationError> {
        self.validator
            .iter_errors(doc)
            .map(|error| {
                let path = pointer_to_path(&error.instance_path.to_string());
                match &error.kind {
                    ValidationErrorKind::Required { property } => ValidationError::MissingField {
                        field: join_path(&path, property.as_str().unwrap_or_default()),
                    },
                    ValidationErrorKind::Type { kind } => ValidationError::TypeMismatch {
                        field: path,
                        expected: match kind {
                            TypeKind::Single(t) => t.to_string(),
                            TypeKind::Multiple(_) => "one of several types".to_string(),
                        },
                        actual: json_type_name(&error.instance).to_string(),
                    },
                    _ => ValidationError::InvalidValue {
                        field: path,
                        reason: error.to_string(),
                    },
                }
            })
            .collect()
    }

    fn semantic_errors(&self, doc: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for field in ["agent_id", "intent.mission", "memory_state.continuity_hash"] {
            if let Some(Value::String(s)) = resolve_path(doc, field) {
                if s.trim().is_empty() {
                    errors.push(ValidationError::InvalidValue {
                        field: field.to_string(),
                        reason: "must not be blank".to_string(),
                    });
                }
            }
        }

        for field in ["capabilities.compute_profile.cpu", "capabilities.compute_profile.memory_gb"] {
            if let Some(n) = resolve_path(doc, field).and_then(Value::as_f64) {
                if n <= 0.0 {
                    errors.push(ValidationError::InvalidValue {
                        field: field.to_string(),
                        reason: format!("must be greater than 0, got {n}"),
                    });
                }
            }
        }

        if let Some(Value::String(version)) = resolve_path(doc, "protocol_version") {
            if !self.supported_versions.iter().any(|v| v == version) {
                errors.push(ValidationError::UnsupportedVersion {
                    version: version.clone(),
                    supported: self.supported_versions.clone(),
                });
            }
        }

        errors
    }
}

impl ManifestValidator for ManifestSchemaValidator {
    fn validate(&self, raw: &RawManifest) -> Result<ValidatedManifest, ManifestRejection> {
        let doc = Self::parse(raw).map_err(ManifestRejection::single)?;

        // ── Phase 1 & 2: collect everything ──────────────────────────────────
        let mut errors = self.structural_errors(&doc);
        errors.extend(self.semantic_errors(&doc));

        if !errors.is_empty() {
            errors.sort_by(|a, b| {
                a.field()
                    .cmp(b.field())
                    .then_with(|| a.to_string().cmp(&b.to_string()))
            });
            errors.dedup();
            warn!(violations = errors.len(), format = %raw.format, "manifest failed validation");
            return Err(ManifestRejection { errors });
        }

        // The schema guarantees the shape; this only fails on values serde
        // rejects that the schema cannot express.
        let manifest: Manifest = serde_json::from_value(doc).map_err(|e| {
            ManifestRejection::single(ValidationError::Malformed {
                format: raw.format,
                reason: e.to_string(),
            })
        })?;

        debug!(agent_id = %manifest.agent_id, format = %raw.format, "manifest validated");
        Ok(ValidatedManifest::from_checked(manifest))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Resolve a dot-notation field path against a JSON value.
fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// `/capabilities/interfaces/2` → `capabilities.interfaces[2]`; the root is
/// `<document>`.
fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }
    if path.is_empty() {
        DOCUMENT.to_string()
    } else {
        path
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent == DOCUMENT {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
