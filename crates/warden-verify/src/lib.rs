//! # warden-verify
//!
//! Manifest schema validation and claim verification for the Warden gateway.
//!
//! ## Overview
//!
//! - [`ManifestSchemaValidator`] implements
//!   [`ManifestValidator`](warden_core::traits::ManifestValidator): JSON or
//!   TOML in, every violation out.
//! - [`GraphClaimVerifier`] implements
//!   [`ClaimVerifier`](warden_core::traits::ClaimVerifier) against any
//!   [`KnowledgeGraph`](warden_core::traits::KnowledgeGraph), with
//!   [`MarkerClassifier`] deciding uncited opinion from uncited fact.
//! - [`InMemoryKnowledgeGraph`] is a reference oracle for tests and demos.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_verify::{GraphClaimVerifier, InMemoryKnowledgeGraph, MarkerClassifier};
//!
//! let graph = Arc::new(InMemoryKnowledgeGraph::new());
//! graph.add_fact("kg://mars/moons", "Mars has two moons.");
//! let verifier = GraphClaimVerifier::new(graph, Box::new(MarkerClassifier::new(&cfg)), &cfg);
//! ```

pub mod claim;
pub mod graph;
pub mod heuristic;
pub mod schema;

pub use claim::GraphClaimVerifier;
pub use graph::InMemoryKnowledgeGraph;
pub use heuristic::MarkerClassifier;
pub use schema::ManifestSchemaValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────
