//! Claim-log entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_contracts::claim::ClaimRecord;

/// One link in a session's claim-log hash chain.
///
/// Changing any field, including inside `record`, invalidates `this_hash`
/// and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub session_id: String,
    pub record: ClaimRecord,
    /// `this_hash` of the previous entry, or `GENESIS_HASH`.
    pub prev_hash: String,
    pub this_hash: String,
}

impl LogEntry {
    /// The `prev_hash` of the first entry in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A point-in-time export of one session's claim log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLogExport {
    pub session_id: String,
    pub entries: Vec<LogEntry>,
    /// True once the session that owns the log has closed.
    pub sealed: bool,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last entry; empty for an empty log.
    pub terminal_hash: String,
}
