use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{AggregateRanking, Stage2Ranking};

/// Derives per-model aggregate rankings from the parsed peer rankings.
///
/// Each ranker contributes the 1-based position it assigned to a model;
/// labels that do not map to a known model are skipped. Models never placed
/// by any ranker are absent from the output. The result is sorted ascending
/// by average rank (1 = best); ties keep first-mention order, which is
/// deliberately unspecified beyond being stable within a run.
pub fn calculate_aggregate_rankings(
    stage2_results: &[Stage2Ranking],
    label_to_model: &BTreeMap<String, String>,
) -> Vec<AggregateRanking> {
    let mut model_positions: Vec<(String, Vec<usize>)> = Vec::new();

    for ranking in stage2_results {
        for (index, label) in ranking.parsed_ranking.iter().enumerate() {
            let Some(model) = label_to_model.get(label) else {
                continue;
            };
            let position = index + 1;
            match model_positions
                .iter_mut()
                .find(|(existing, _)| existing == model)
            {
                Some((_, positions)) => positions.push(position),
                None => model_positions.push((model.clone(), vec![position])),
            }
        }
    }

    let mut aggregate: Vec<AggregateRanking> = model_positions
        .into_iter()
        .map(|(model, positions)| {
            let sum: usize = positions.iter().sum();
            AggregateRanking {
                model,
                average_rank: sum as f64 / positions.len() as f64,
                rankings_count: positions.len(),
            }
        })
        .collect();

    // Stable sort keeps insertion order between equal averages.
    aggregate.sort_by(|a, b| {
        a.average_rank
            .partial_cmp(&b.average_rank)
            .unwrap_or(Ordering::Equal)
    });

    aggregate
}
