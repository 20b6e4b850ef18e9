//! Memoizing layer over the composer.
//!
//! Hybrid results are keyed by `(user, price window, anchor item)`, similar
//! item results by item. An entry computed for `n` results also serves any
//! request for `n` or fewer; a larger request recomputes and replaces it.
//!
//! Entries never expire on their own. Call [`CachedComposer::record_rating`]
//! after the storefront records a rating, or
//! [`CachedComposer::invalidate_all`] after bulk changes (re-clustering,
//! catalog updates).

use super::composer::RecommendationComposer;
use super::types::{RecommendationCandidate, RecommendationRequest};
use crate::ratings::{ItemId, RatingSample, UserId};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HybridKey {
    user_id: UserId,
    /// Price bounds as raw bits so the key is hashable
    price: Option<(u64, u64)>,
    anchor_item: Option<ItemId>,
}

impl HybridKey {
    fn from_request(request: &RecommendationRequest) -> Self {
        Self {
            user_id: request.user_id,
            price: request
                .price_range
                .map(|range| (range.min.to_bits(), range.max.to_bits())),
            anchor_item: request.anchor_item,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// Count the entry was computed for
    count: usize,
    candidates: Vec<RecommendationCandidate>,
}

impl Entry {
    fn serve(&self, count: usize) -> Option<Vec<RecommendationCandidate>> {
        (count <= self.count).then(|| self.candidates.iter().take(count).cloned().collect())
    }
}

/// Cache statistics for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hybrid_entries: usize,
    pub similar_entries: usize,
}

/// [`RecommendationComposer`] with memoized results.
pub struct CachedComposer {
    composer: RecommendationComposer,
    hybrid: RwLock<HashMap<HybridKey, Entry>>,
    similar: RwLock<HashMap<ItemId, Entry>>,
}

impl CachedComposer {
    pub fn new(composer: RecommendationComposer) -> Self {
        Self {
            composer,
            hybrid: RwLock::new(HashMap::new()),
            similar: RwLock::new(HashMap::new()),
        }
    }

    pub fn composer(&self) -> &RecommendationComposer {
        &self.composer
    }

    /// Cached [`RecommendationComposer::recommend`].
    pub async fn recommend(&self, request: &RecommendationRequest) -> Vec<RecommendationCandidate> {
        let key = HybridKey::from_request(request);

        let cached = self
            .hybrid
            .read()
            .ok()
            .and_then(|entries| entries.get(&key).and_then(|e| e.serve(request.count)));
        if let Some(candidates) = cached {
            debug!("Cache hit for user {}", request.user_id);
            return candidates;
        }

        let candidates = self.composer.recommend(request).await;
        if let Ok(mut entries) = self.hybrid.write() {
            entries.insert(
                key,
                Entry {
                    count: request.count,
                    candidates: candidates.clone(),
                },
            );
        }
        candidates
    }

    /// Cached [`RecommendationComposer::similar_items`].
    pub async fn similar_items(&self, item_id: ItemId, count: usize) -> Vec<RecommendationCandidate> {
        let cached = self
            .similar
            .read()
            .ok()
            .and_then(|entries| entries.get(&item_id).and_then(|e| e.serve(count)));
        if let Some(candidates) = cached {
            debug!("Cache hit for items similar to {}", item_id);
            return candidates;
        }

        let candidates = self.composer.similar_items(item_id, count).await;
        if let Ok(mut entries) = self.similar.write() {
            entries.insert(
                item_id,
                Entry {
                    count,
                    candidates: candidates.clone(),
                },
            );
        }
        candidates
    }

    /// Drops everything a new rating can change: the rating user's hybrid
    /// entries and every similar-items entry.
    pub fn record_rating(&self, sample: &RatingSample) {
        if let Ok(mut entries) = self.hybrid.write() {
            entries.retain(|key, _| key.user_id != sample.user_id);
        }
        if let Ok(mut entries) = self.similar.write() {
            entries.clear();
        }
        debug!(
            "Invalidated cached results after user {} rated item {}",
            sample.user_id, sample.item_id
        );
    }

    /// Drops every cached result.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.hybrid.write() {
            entries.clear();
        }
        if let Ok(mut entries) = self.similar.write() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hybrid_entries: self.hybrid.read().map(|e| e.len()).unwrap_or(0),
            similar_entries: self.similar.read().map(|e| e.len()).unwrap_or(0),
        }
    }
}
