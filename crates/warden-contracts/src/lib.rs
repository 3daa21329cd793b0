//! # warden-contracts
//!
//! Shared types, configuration and error contracts for the Warden ingestion
//! gateway.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, defaults and error types.

pub mod claim;
pub mod config;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod sandbox;
pub mod session;
pub mod trust;
