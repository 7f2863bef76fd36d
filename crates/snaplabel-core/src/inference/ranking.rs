//! Ranking raw class scores into the top-k predictions.

use super::labels::Labels;
use crate::types::Classification;

/// Rank `scores` descending and keep the first `k`.
///
/// The first `offset` scores are skipped (a background class, for example);
/// the remaining positions map onto `labels` starting at zero. Equal scores
/// keep ascending class order, so output is a pure function of the input.
pub fn top_k(scores: &[f32], labels: &Labels, offset: usize, k: usize) -> Vec<Classification> {
    let mut indexed: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .skip(offset)
        .map(|(idx, score)| (idx - offset, score))
        .filter(|(_, score)| score.is_finite())
        .collect();

    // sort_by is stable, so ties stay in index order
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);

    indexed
        .into_iter()
        .map(|(idx, score)| Classification::new(labels.name(idx), score))
        .collect()
}
