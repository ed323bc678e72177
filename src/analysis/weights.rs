//! Weight normalisation.
//!
//! Client weights are relative. They are rescaled twice: within each
//! category so a category's weights sum to 100, and across the whole
//! request so every weight sums to 100.

use std::collections::BTreeMap;

use super::types::{AnalysisCategory, AnalysisStatisticsType, WeightedStatisticsRange};

pub type RangeMap = BTreeMap<AnalysisStatisticsType, WeightedStatisticsRange>;
pub type WeightMap = BTreeMap<AnalysisStatisticsType, f64>;

fn category_totals(ranges: &RangeMap) -> BTreeMap<AnalysisCategory, f64> {
    let mut totals = BTreeMap::new();
    for (stat, range) in ranges {
        *totals.entry(stat.category()).or_insert(0.0) += range.effective_weight();
    }
    totals
}

/// Weights rescaled within each category.
pub fn category_normalized_weights(ranges: &RangeMap) -> WeightMap {
    let totals = category_totals(ranges);

    ranges
        .iter()
        .map(|(stat, range)| {
            let total = totals.get(&stat.category()).copied().unwrap_or(0.0);
            let weight = if total > 0.0 {
                range.effective_weight() / total * 100.0
            } else {
                0.0
            };
            (*stat, weight)
        })
        .collect()
}

/// Weights rescaled across every indicator. Empty when all weights are 0.
pub fn global_normalized_weights(ranges: &RangeMap) -> WeightMap {
    let totals = category_totals(ranges);
    let global_total: f64 = totals.values().sum();
    if global_total == 0.0 {
        return WeightMap::new();
    }

    ranges
        .iter()
        .map(|(stat, range)| {
            let category_total = totals.get(&stat.category()).copied().unwrap_or(0.0);
            let category_ratio = category_total / global_total;
            let type_ratio = if category_total > 0.0 {
                range.effective_weight() / category_total
            } else {
                0.0
            };
            (*stat, category_ratio * type_ratio * 100.0)
        })
        .collect()
}

/// Weighted sum of original scores, clamped to [0, 1]. Scores without a
/// global weight do not contribute.
pub fn final_weighted_score(
    original_scores: &BTreeMap<AnalysisStatisticsType, f64>,
    global_weights: &WeightMap,
) -> f64 {
    let total: f64 = original_scores
        .iter()
        .filter_map(|(stat, score)| global_weights.get(stat).map(|w| score * w / 100.0))
        .sum();
    total.clamp(0.0, 1.0)
}
