//! Manifest anchoring.
//!
//! Every admitted manifest is stored under an integrity hash computed over
//! its intent, capabilities and memory state. Identity and trust fields are
//! left out, so the same agent body re-submitted under a new display name or
//! with fresh attestations anchors to the same hash.
//!
//! `retrieve` recomputes the hash from the stored manifest and reports
//! whether the record is still intact.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use warden_contracts::{
    error::{WardenError, WardenResult},
    manifest::{AgentId, Manifest, MemoryState, ValidatedManifest},
};
use warden_core::traits::ManifestRegistry;

/// SHA-256 over the compact JSON of `(intent, capabilities, memory_state)`.
pub fn integrity_hash(manifest: &Manifest) -> WardenResult<String> {
    let body = (&manifest.intent, &manifest.capabilities, &manifest.memory_state);
    let bytes = serde_json::to_vec(&body).map_err(|e| WardenError::LogWriteFailed {
        reason: format!("manifest could not be serialized for anchoring: {}", e),
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// A manifest as stored at anchoring time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub integrity_hash: String,
    pub agent_id: AgentId,
    pub manifest: Manifest,
    pub anchored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    Intact,
    Corrupted,
}

/// The outcome of `ManifestAnchor::retrieve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReport {
    pub status: AnchorStatus,
    pub recalculated_hash: String,
    pub record: AnchorRecord,
}

#[derive(Default)]
pub(crate) struct AnchorState {
    pub(crate) by_hash: HashMap<String, AnchorRecord>,
    /// Hash of each agent's most recent anchor.
    pub(crate) latest: HashMap<AgentId, String>,
}

/// An in-memory `ManifestRegistry`. Clones share the same store.
#[derive(Clone, Default)]
pub struct ManifestAnchor {
    pub(crate) state: Arc<Mutex<AnchorState>>,
}

impl ManifestAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an anchor by hash and check it against a fresh recomputation.
    pub fn retrieve(&self, hash: &str) -> Option<AnchorReport> {
        let record = self.lock().by_hash.get(hash).cloned()?;

        let (status, recalculated_hash) = match integrity_hash(&record.manifest) {
            Ok(h) if h == record.integrity_hash => (AnchorStatus::Intact, h),
            Ok(h) => (AnchorStatus::Corrupted, h),
            Err(_) => (AnchorStatus::Corrupted, String::new()),
        };
        if status == AnchorStatus::Corrupted {
            warn!(
                agent_id = %record.agent_id,
                stored_hash = %record.integrity_hash,
                recalculated_hash = %recalculated_hash,
                "anchored manifest failed integrity check"
            );
        }

        Some(AnchorReport {
            status,
            recalculated_hash,
            record,
        })
    }

    /// Number of distinct anchored manifests.
    pub fn len(&self) -> usize {
        self.lock().by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AnchorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ManifestRegistry for ManifestAnchor {
    fn anchor(&self, manifest: &ValidatedManifest) -> WardenResult<String> {
        let hash = integrity_hash(manifest.manifest())?;
        let agent_id = manifest.agent_id().clone();

        let mut state = self.lock();
        state.by_hash.insert(
            hash.clone(),
            AnchorRecord {
                integrity_hash: hash.clone(),
                agent_id: agent_id.clone(),
                manifest: manifest.manifest().clone(),
                anchored_at: Utc::now(),
            },
        );
        state.latest.insert(agent_id.clone(), hash.clone());

        debug!(agent_id = %agent_id, integrity_hash = %hash, "manifest anchored");
        Ok(hash)
    }

    fn prior_memory(&self, agent_id: &AgentId) -> Option<MemoryState> {
        let state = self.lock();
        let hash = state.latest.get(agent_id)?;
        state
            .by_hash
            .get(hash)
            .map(|record| record.manifest.memory_state.clone())
    }
}
