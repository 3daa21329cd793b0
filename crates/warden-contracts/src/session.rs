//! Session identity, the assignment response, and the history view the
//! metrics aggregator reads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    claim::{AgentMessage, ClaimRecord},
    manifest::{AgentId, MemoryState},
    sandbox::SandboxPolicy,
    trust::TrustScore,
};

/// Unique identifier for one agent session.
///
/// Appears in the assignment response, every claim-log entry and every
/// tracing event emitted on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the gateway returns to an admitted agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxAssignment {
    pub session_id: SessionId,
    pub agent_id: AgentId,
    pub policy: SandboxPolicy,
    pub trust_score: TrustScore,
    /// Integrity hash of the anchored manifest, when a registry is configured.
    pub integrity_hash: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// A read-only view of everything a session has accumulated so far.
#[derive(Debug, Clone, Copy)]
pub struct SessionHistory<'a> {
    pub messages: &'a [AgentMessage],
    pub claims: &'a [ClaimRecord],
    pub memory: &'a MemoryState,
    /// The memory state recorded for this agent before the current session.
    pub prior_memory: Option<&'a MemoryState>,
}
