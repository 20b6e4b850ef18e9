// Weighted score fusion and display normalization

use super::types::ScoredItem;
use crate::ratings::ItemId;
use std::collections::BTreeMap;

/// Combine scored lists from multiple sources by weighted sum.
///
/// Formula: score(i) = sum_{s} weight_s * score_s(i)
///
/// Where:
/// - i is an item
/// - s is a source with its configured weight
/// - score_s(i) is the raw score source s gave item i (absent = no contribution)
///
/// Raw scores are summed before any normalization, so a source with a wider
/// score scale carries more influence than its weight alone suggests.
///
/// Non-finite scores contribute nothing; an item with no finite score is
/// left out.
///
/// The output is ordered by item id; use [`sort_by_score`] to rank it.
pub fn merge_weighted(sources: &[(&[ScoredItem], f64)]) -> Vec<ScoredItem> {
    let mut merged: BTreeMap<ItemId, f64> = BTreeMap::new();

    for (items, weight) in sources {
        for item in items.iter().filter(|item| item.score.is_finite()) {
            *merged.entry(item.item_id).or_insert(0.0) += weight * item.score;
        }
    }

    merged
        .into_iter()
        .map(|(item_id, score)| ScoredItem::new(item_id, score))
        .collect()
}

/// Min-max normalize scores into `[lo, hi]`.
///
/// `lo + (s - min) / (max - min) * (hi - lo)`. When every score is equal
/// (including a single item) each score becomes the midpoint of the range.
pub fn normalize_scores(items: &mut [ScoredItem], lo: f64, hi: f64) {
    let Some(first) = items.first() else {
        return;
    };

    let (min, max) = items
        .iter()
        .fold((first.score, first.score), |(min, max), item| {
            (min.min(item.score), max.max(item.score))
        });

    let spread = max - min;
    for item in items.iter_mut() {
        item.score = if spread > 0.0 {
            lo + (item.score - min) / spread * (hi - lo)
        } else {
            (lo + hi) / 2.0
        };
    }
}

/// Sort by score descending; ties go to the lower item id.
pub fn sort_by_score(items: &mut [ScoredItem]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.item_id.cmp(&b.item_id)));
}

/// Normalize into `[lo, hi]`, rank, and keep the top `count`.
pub fn normalize_and_rank(mut items: Vec<ScoredItem>, count: usize, lo: f64, hi: f64) -> Vec<ScoredItem> {
    normalize_scores(&mut items, lo, hi);
    sort_by_score(&mut items);
    items.truncate(count);
    items
}
