//! Hash-chain primitives for claim logs.
//!
//! Hash input layout (bytes, in order):
//!   1. session_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the claim record

use sha2::{Digest, Sha256};

use warden_contracts::{
    claim::ClaimRecord,
    error::{WardenError, WardenResult},
};

use crate::event::LogEntry;

/// Compute the SHA-256 link hash for one claim-log entry.
///
/// Commits to the entry's position (`sequence`), its session, the previous
/// entry's hash and the full claim record. Returns lowercase hex.
pub fn hash_entry(
    session_id: &str,
    sequence: u64,
    record: &ClaimRecord,
    prev_hash: &str,
) -> WardenResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| WardenError::LogWriteFailed {
        reason: format!("claim record could not be serialized: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a claim-log chain.
///
/// Valid when every entry's `sequence` equals its position, its `prev_hash`
/// equals the preceding `this_hash` (`GENESIS_HASH` for the first), and its
/// `this_hash` matches the recomputed value. An empty chain is valid.
pub fn verify_chain(entries: &[LogEntry]) -> bool {
    let mut expected_prev = LogEntry::GENESIS_HASH;

    for (position, entry) in entries.iter().enumerate() {
        if entry.sequence != position as u64 || entry.prev_hash != expected_prev {
            return false;
        }

        match hash_entry(&entry.session_id, entry.sequence, &entry.record, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }

        expected_prev = entry.this_hash.as_str();
    }

    true
}
