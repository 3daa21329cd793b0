//! The default metrics aggregator.
//!
//! Formulas:
//!
//!   complexity = min(1, log2(1 + tokens + cited_claims) / saturation_bits)
//!   novelty    = distinct tokens / total tokens            (0 when empty)
//!   continuity = 1                                          (no prior, or same lineage)
//!              | lineage_penalty × jaccard(prior summaries, current summaries)
//!   composite  = weighted sum, weights normalized to sum to 1
//!
//! Tokens are the lowercase alphanumeric words of every message's content.
//! Every snapshot is recomputed from the full history.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use tracing::debug;

use warden_contracts::{
    claim::AgentMessage,
    config::MetricsConfig,
    manifest::MemoryState,
    metrics::{LabelTally, MetricsSnapshot},
    session::SessionHistory,
};
use warden_core::traits::MetricsAggregator;

#[derive(Debug, Clone)]
pub struct ThriveAggregator {
    /// complexity, novelty, continuity; non-negative and summing to 1.
    weights: [f64; 3],
    saturation_bits: f64,
    lineage_penalty: f64,
}

impl ThriveAggregator {
    pub fn new(config: &MetricsConfig) -> Self {
        let raw = [config.complexity_weight, config.novelty_weight, config.continuity_weight]
            .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
        let sum: f64 = raw.iter().sum();
        let weights = if sum > 0.0 {
            raw.map(|w| w / sum)
        } else {
            [1.0 / 3.0; 3]
        };

        Self {
            weights,
            saturation_bits: if config.complexity_saturation_bits.is_finite()
                && config.complexity_saturation_bits > 0.0
            {
                config.complexity_saturation_bits
            } else {
                MetricsConfig::default().complexity_saturation_bits
            },
            lineage_penalty: clamp_unit(config.lineage_penalty),
        }
    }

    pub fn complexity(&self, messages: &[AgentMessage]) -> f64 {
        let tokens: usize = messages.iter().map(|m| tokens(&m.content).count()).sum();
        let cited: usize = messages
            .iter()
            .flat_map(|m| &m.claims)
            .filter(|c| !c.citations.is_empty())
            .count();
        let size = (1 + tokens + cited) as f64;
        (size.log2() / self.saturation_bits).min(1.0)
    }

    pub fn novelty(&self, messages: &[AgentMessage]) -> f64 {
        let mut total = 0usize;
        let mut distinct = HashSet::new();
        for token in messages.iter().flat_map(|m| tokens(&m.content)) {
            total += 1;
            distinct.insert(token);
        }
        if total == 0 {
            return 0.0;
        }
        distinct.len() as f64 / total as f64
    }

    pub fn continuity(&self, current: &MemoryState, prior: Option<&MemoryState>) -> f64 {
        let Some(prior) = prior else {
            return 1.0;
        };
        if prior.continuity_hash == current.continuity_hash {
            return 1.0;
        }
        self.lineage_penalty * jaccard(&prior.summaries, &current.summaries)
    }
}

impl MetricsAggregator for ThriveAggregator {
    fn snapshot(&self, history: &SessionHistory<'_>) -> MetricsSnapshot {
        let complexity = self.complexity(history.messages);
        let novelty = self.novelty(history.messages);
        let continuity = self.continuity(history.memory, history.prior_memory);

        let [wc, wn, wt] = self.weights;
        let composite = clamp_unit(wc * complexity + wn * novelty + wt * continuity);

        let mut labels = LabelTally::default();
        for record in history.claims {
            labels.record(record.result.label);
        }

        debug!(
            messages = history.messages.len(),
            claims = history.claims.len(),
            complexity,
            novelty,
            continuity,
            composite,
            "metrics snapshot computed"
        );

        MetricsSnapshot {
            complexity,
            novelty,
            continuity,
            composite,
            labels,
            message_count: history.messages.len(),
            claim_count: history.claims.len(),
            computed_at: Utc::now(),
        }
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Jaccard similarity of two summary lists taken as sets. Two empty lists
/// share nothing, so they score 0.
fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
