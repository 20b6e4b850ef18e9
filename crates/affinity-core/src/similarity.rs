//! Similarity functions over rating data.
//!
//! - [`cosine_similarity`] compares two dense vectors (user vectors, cluster
//!   prototypes).
//! - [`adjusted_cosine_similarity`] compares two items from their sparse,
//!   user-sorted preference lists after subtracting each co-rater's mean
//!   rating, which removes per-user rating bias.
//!
//! All functions are pure and allocation-free on the hot path. An undefined
//! adjusted cosine (no co-raters, zero variance) is `None`: callers exclude
//! such pairs from ranking rather than treating them as 0.

use crate::ratings::{ItemId, ItemPreferences, Preference, RatingSample, UserId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Cosine similarity of two equal-length dense vectors.
///
/// Returns 0.0 when either vector has zero norm, so cluster math never sees
/// NaN. The result is clamped to [-1, 1] to absorb rounding.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "cosine similarity needs equal lengths");

    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|y| y * y).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Mean rating of every user, computed over all of that user's samples.
#[derive(Debug, Clone, Default)]
pub struct UserMeans {
    means: HashMap<UserId, f64>,
}

impl UserMeans {
    /// Computes per-user means from rating samples.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a RatingSample>) -> Self {
        let mut sums: HashMap<UserId, (f64, usize)> = HashMap::new();
        for sample in samples {
            let entry = sums.entry(sample.user_id).or_insert((0.0, 0));
            entry.0 += sample.rating;
            entry.1 += 1;
        }

        Self {
            means: sums
                .into_iter()
                .map(|(user, (sum, count))| (user, sum / count as f64))
                .collect(),
        }
    }

    /// Sets the mean of one user.
    pub fn insert(&mut self, user_id: UserId, mean: f64) {
        self.means.insert(user_id, mean);
    }

    pub fn get(&self, user_id: UserId) -> Option<f64> {
        self.means.get(&user_id).copied()
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Adjusted cosine similarity of two items.
///
/// Both inputs must be sorted ascending by user id (as produced by
/// [`ItemPreferences`]). A two-pointer merge-join walks both lists; for each
/// co-rated user the user's mean rating is subtracted from both ratings before
/// accumulating the numerator and the two denominator sums. Co-raters without
/// a known mean are skipped.
///
/// Returns `None` when either list is empty or a denominator is 0 (no
/// co-raters, or zero variance after centering). The result is symmetric in
/// its two preference arguments.
pub fn adjusted_cosine_similarity(
    prefs_a: &[Preference],
    prefs_b: &[Preference],
    means: &UserMeans,
) -> Option<f64> {
    if prefs_a.is_empty() || prefs_b.is_empty() {
        return None;
    }

    let mut numerator = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;

    let (mut i, mut j) = (0, 0);
    while i < prefs_a.len() && j < prefs_b.len() {
        let (a, b) = (&prefs_a[i], &prefs_b[j]);
        match a.user_id.cmp(&b.user_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if let Some(mean) = means.get(a.user_id) {
                    let centered_a = a.rating - mean;
                    let centered_b = b.rating - mean;
                    numerator += centered_a * centered_b;
                    denom_a += centered_a * centered_a;
                    denom_b += centered_b * centered_b;
                }
                i += 1;
                j += 1;
            }
        }
    }

    if denom_a == 0.0 || denom_b == 0.0 {
        return None;
    }

    Some((numerator / (denom_a.sqrt() * denom_b.sqrt())).clamp(-1.0, 1.0))
}

/// Adjusted cosine of one reference item against each candidate item.
///
/// Repeated single calls with no shared state. The reference item itself and
/// undefined pairs are left out; output order follows `candidates`.
pub fn adjusted_cosine_batch(
    reference: &ItemPreferences,
    candidates: &[ItemPreferences],
    means: &UserMeans,
) -> Vec<(ItemId, f64)> {
    candidates
        .iter()
        .filter(|candidate| candidate.item_id != reference.item_id)
        .filter_map(|candidate| {
            adjusted_cosine_similarity(reference.preferences(), candidate.preferences(), means)
                .map(|similarity| (candidate.item_id, similarity))
        })
        .collect()
}
