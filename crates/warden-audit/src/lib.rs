//! # warden-audit
//!
//! Append-only, SHA-256 hash-chained claim logs and manifest integrity
//! anchoring for the Warden gateway.
//!
//! ## Overview
//!
//! Every labeled claim a session records is wrapped in a `LogEntry` that
//! links to the previous entry via its SHA-256 hash. Rewriting any recorded
//! label breaks the chain and is detected by `verify_chain`.
//!
//! `ManifestAnchor` stores admitted manifests under an integrity hash and
//! remembers each agent's most recent memory state for continuity scoring.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_audit::InMemoryClaimLog;
//! use warden_core::traits::ClaimLogWriter;
//!
//! let log = InMemoryClaimLog::new(session_id.to_string());
//! log.append(&record)?;
//! assert!(log.verify_integrity());
//! ```

pub mod anchor;
pub mod chain;
pub mod event;
pub mod memory;

pub use anchor::{AnchorReport, AnchorStatus, ManifestAnchor};
pub use chain::{hash_entry, verify_chain};
pub use event::{ClaimLogExport, LogEntry};
pub use memory::InMemoryClaimLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
