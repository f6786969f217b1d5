use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One council model's independent answer from Stage 1.
pub struct Stage1Response {
    pub model: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One council model's Stage-2 peer review: the raw evaluation text plus the
/// ordered labels extracted from its `FINAL RANKING:` section.
pub struct Stage2Ranking {
    pub model: String,
    pub ranking: String,
    pub parsed_ranking: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// The chairman model's Stage-3 synthesis.
pub struct Stage3Response {
    pub model: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Mean 1-based rank position assigned to a model across all peer rankings
/// that mentioned it. Lower is better.
pub struct AggregateRanking {
    pub model: String,
    pub average_rank: f64,
    pub rankings_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
/// Per-run derived metadata: the label bijection used for anonymization and
/// the aggregate peer rankings. Ephemeral; callers are not required to
/// persist it.
pub struct CouncilMetadata {
    pub label_to_model: BTreeMap<String, String>,
    pub aggregate_rankings: Vec<AggregateRanking>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Atomic result of one full council run.
pub struct CouncilOutcome {
    pub stage1: Vec<Stage1Response>,
    pub stage2: Vec<Stage2Ranking>,
    pub stage3: Stage3Response,
    pub metadata: CouncilMetadata,
}
