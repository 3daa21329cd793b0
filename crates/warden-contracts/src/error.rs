//! Error types for the Warden gateway.
//!
//! Nothing in here is fatal to the process: every error is scoped to one
//! manifest, one claim, or one session. `ValidationError`s are collected into
//! a `ManifestRejection` so a submitter sees every problem in one round trip.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{claim::ClaimId, manifest::ManifestFormat};

/// One schema violation in a submitted manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required key is absent.
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// A key is present with the wrong JSON type.
    #[error("field '{field}' has type {actual}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// `protocol_version` names a version this gateway does not speak.
    #[error("protocol version '{version}' is not supported (supported: {})", .supported.join(", "))]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// A key has the right type but an unusable value (blank id, cpu = 0, ...).
    #[error("field '{field}' is invalid: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The document could not be parsed at all.
    #[error("document is not valid {format}: {reason}")]
    Malformed {
        format: ManifestFormat,
        reason: String,
    },
}

impl ValidationError {
    /// Dotted path of the offending field; `<document>` for whole-document errors.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::InvalidValue { field, .. } => field,
            ValidationError::UnsupportedVersion { .. } => "protocol_version",
            ValidationError::Malformed { .. } => "<document>",
        }
    }
}

/// Every violation found in one manifest. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRejection {
    pub errors: Vec<ValidationError>,
}

impl ManifestRejection {
    pub fn single(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }

    /// Iterate over the offending field paths, in rejection order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(ValidationError::field)
    }
}

impl fmt::Display for ManifestRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest rejected with {} violation(s)", self.errors.len())?;
        for (idx, error) in self.errors.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ManifestRejection {}

/// The knowledge-graph oracle could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("knowledge graph unavailable: {reason}")]
pub struct OracleError {
    pub reason: String,
}

impl OracleError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// A claim could not be labeled right now.
///
/// Never a label and never written to the claim log. Callers may resubmit
/// the claim when `is_retryable()` is true.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("oracle did not answer for claim '{claim_id}' within {timeout_ms} ms")]
    Timeout { claim_id: ClaimId, timeout_ms: u64 },

    #[error("oracle unavailable while verifying claim '{claim_id}': {reason}")]
    OracleUnavailable { claim_id: ClaimId, reason: String },

    #[error("verification of claim '{claim_id}' was cancelled by session teardown")]
    Cancelled { claim_id: ClaimId },
}

impl VerificationError {
    pub fn claim_id(&self) -> &ClaimId {
        match self {
            VerificationError::Timeout { claim_id, .. }
            | VerificationError::OracleUnavailable { claim_id, .. }
            | VerificationError::Cancelled { claim_id } => claim_id,
        }
    }

    /// Oracle trouble is worth retrying; a torn-down session is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, VerificationError::Cancelled { .. })
    }
}

/// The unified error type for gateway and session operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// The manifest failed schema validation.
    #[error(transparent)]
    ManifestRejected(#[from] ManifestRejection),

    /// The manifest is well-formed but an admission rule refused it.
    #[error("admission denied for agent '{agent_id}': {reason}")]
    AdmissionDenied { agent_id: String, reason: String },

    /// Another active session already holds this agent id.
    #[error("agent '{agent_id}' already has an active session")]
    DuplicateSession { agent_id: String },

    /// An elevation request exceeded what the policy allows. Fails closed.
    #[error("elevation rejected: {reason}")]
    ElevationRejected { reason: String },

    /// The session has been torn down; nothing more is accepted.
    #[error("session '{session_id}' is closed")]
    SessionClosed { session_id: String },

    /// The claim log could not append a record.
    #[error("claim log write failed: {reason}")]
    LogWriteFailed { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the Warden crates.
pub type WardenResult<T> = Result<T, WardenError>;
