//! # warden-core
//!
//! The ingestion gateway and per-session runtime for Warden agents.
//!
//! This crate provides:
//! - The trait seams every component sits behind (`traits`)
//! - The `Gateway` that turns an untrusted manifest into a sandbox assignment
//! - The `Session` that verifies claims, grants elevations and reports metrics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{Gateway, Session, SessionServices};
//!
//! let admission = gateway.admit(&RawManifest::json(text))?;
//! let mut session = Session::open(admission, services, Box::new(log));
//! let outcomes = session.submit(message).await?;
//! ```

pub mod gateway;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

pub use gateway::{Admission, Gateway, SessionLease};
pub use session::{ClaimOutcome, Session, SessionServices, TeardownHandle};
