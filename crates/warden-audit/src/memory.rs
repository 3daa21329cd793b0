//! In-memory implementation of `ClaimLogWriter`.
//!
//! `InMemoryClaimLog` keeps every entry in a `Vec` behind a `Mutex`. Clones
//! share the same chain, so a caller can hand one clone to a `Session` and
//! keep another for `export_log()` and `verify_integrity()`.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use warden_contracts::{
    claim::ClaimRecord,
    error::{WardenError, WardenResult},
};
use warden_core::traits::ClaimLogWriter;

use crate::{
    chain::{hash_entry, verify_chain},
    event::{ClaimLogExport, LogEntry},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct LogState {
    pub(crate) entries: Vec<LogEntry>,
    /// The `this_hash` of the last entry, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
    pub(crate) sealed: bool,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An append-only claim log backed by a SHA-256 hash chain.
///
/// Entries are never modified or removed. Appending after `seal` fails with
/// `LogWriteFailed`.
#[derive(Clone)]
pub struct InMemoryClaimLog {
    session_id: String,
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl InMemoryClaimLog {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Arc::new(Mutex::new(LogState {
                entries: Vec::new(),
                last_hash: LogEntry::GENESIS_HASH.to_string(),
                sealed: false,
            })),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry written so far, with the current terminal hash.
    pub fn export_log(&self) -> ClaimLogExport {
        let state = self.lock();
        ClaimLogExport {
            session_id: self.session_id.clone(),
            entries: state.entries.clone(),
            sealed: state.sealed,
            exported_at: Utc::now(),
            terminal_hash: state
                .entries
                .last()
                .map(|e| e.this_hash.clone())
                .unwrap_or_default(),
        }
    }

    /// Check that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.lock().entries)
    }

    /// Readers never fail: a poisoned lock still holds a consistent chain,
    /// since every write completes before the guard is released.
    fn lock(&self) -> std::sync::MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_for_write(&self) -> WardenResult<std::sync::MutexGuard<'_, LogState>> {
        self.state.lock().map_err(|e| WardenError::LogWriteFailed {
            reason: format!("claim log lock poisoned: {}", e),
        })
    }
}

// ── ClaimLogWriter impl ───────────────────────────────────────────────────────

impl ClaimLogWriter for InMemoryClaimLog {
    fn append(&self, record: &ClaimRecord) -> WardenResult<u64> {
        let mut state = self.lock_for_write()?;
        if state.sealed {
            return Err(WardenError::LogWriteFailed {
                reason: format!("claim log for session '{}' is sealed", self.session_id),
            });
        }

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(&self.session_id, sequence, record, &prev_hash)?;

        state.entries.push(LogEntry {
            sequence,
            session_id: self.session_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(
            session_id = %self.session_id,
            sequence,
            claim_id = %record.claim.claim_id,
            label = %record.result.label,
            "claim appended"
        );
        Ok(sequence)
    }

    fn records(&self) -> Vec<ClaimRecord> {
        self.lock().entries.iter().map(|e| e.record.clone()).collect()
    }

    fn seal(&self, session_id: &str) -> WardenResult<()> {
        let mut state = self.lock_for_write()?;
        state.sealed = true;

        info!(
            session_id = %session_id,
            entry_count = state.entries.len(),
            terminal_hash = %state.last_hash,
            "claim log sealed"
        );
        Ok(())
    }
}
