//! In-memory reference knowledge graph.
//!
//! Each citation id resolves to a set of supported statements and a set of
//! refuted statements. A claim matches when its normalized text equals a
//! supported statement, and contradicts when it equals a refuted one.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use warden_contracts::{claim::OracleAnswer, error::OracleError};
use warden_core::traits::KnowledgeGraph;

use crate::heuristic::words;

#[derive(Default)]
struct Entries {
    facts: HashMap<String, HashSet<String>>,
    refutations: HashMap<String, HashSet<String>>,
}

/// A `KnowledgeGraph` held entirely in memory.
///
/// `take_offline` makes every query fail with `OracleError`, which is how
/// tests and the demo simulate an oracle outage.
#[derive(Default)]
pub struct InMemoryKnowledgeGraph {
    entries: RwLock<Entries>,
    offline: AtomicBool,
}

impl InMemoryKnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `citation_id` supports `statement`.
    pub fn add_fact(&self, citation_id: impl Into<String>, statement: &str) -> &Self {
        self.write()
            .facts
            .entry(citation_id.into())
            .or_default()
            .insert(normalize(statement));
        self
    }

    /// Record that `citation_id` refutes `statement`.
    pub fn add_refutation(&self, citation_id: impl Into<String>, statement: &str) -> &Self {
        self.write()
            .refutations
            .entry(citation_id.into())
            .or_default()
            .insert(normalize(statement));
        self
    }

    pub fn take_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn bring_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KnowledgeGraph for InMemoryKnowledgeGraph {
    async fn query(&self, citation_id: &str, claim_text: &str) -> Result<OracleAnswer, OracleError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(OracleError::new("knowledge graph is offline"));
        }

        let statement = normalize(claim_text);
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let holds = |table: &HashMap<String, HashSet<String>>| {
            table.get(citation_id).is_some_and(|s| s.contains(&statement))
        };

        let answer = if holds(&entries.facts) {
            OracleAnswer::Match
        } else if holds(&entries.refutations) {
            OracleAnswer::Contradiction
        } else {
            OracleAnswer::NotFound
        };
        debug!(citation_id = %citation_id, answer = ?answer, "knowledge graph queried");
        Ok(answer)
    }
}

/// Lowercase words joined by single spaces; punctuation is dropped.
fn normalize(statement: &str) -> String {
    words(statement).join(" ")
}
