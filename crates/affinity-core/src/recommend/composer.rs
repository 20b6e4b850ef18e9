//! Hybrid recommendation composer.
//!
//! Fans a request out to the user-based, item-based and cluster-based
//! sources concurrently, merges their raw scores by configured weight,
//! applies the optional price window, normalizes into the display range and
//! ranks. Users without history get the popular-items list instead.
//!
//! Collaborator failures never reach the caller: a failing or slow source
//! contributes nothing, a failing name lookup falls back to `item-<id>`.
//! Items the user already rated never appear in hybrid results.

use super::collaborators::{
    BaselineItemRecommender, BaselineUserRecommender, CatalogLookup, ClusterRecommender,
    PopularItemsProvider,
};
use super::fusion::{merge_weighted, normalize_and_rank};
use super::types::{
    CandidateSource, PriceRange, RecommendationCandidate, RecommendationRequest, ScoredItem,
};
use crate::config::ComposerConfig;
use crate::error::ConfigError;
use crate::metrics::{elapsed_ms, global_metrics, EngineMetrics};
use crate::ratings::{ItemId, RatingStore};
use instant::Instant;
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sources are asked for this many times the requested count, leaving room
/// for the price filter and for overlap between sources.
const SOURCE_OVERSAMPLE: usize = 2;

/// External collaborators the composer reads from.
#[derive(Clone)]
pub struct Collaborators {
    pub ratings: Arc<dyn RatingStore>,
    pub user_based: Arc<dyn BaselineUserRecommender>,
    pub item_based: Arc<dyn BaselineItemRecommender>,
    pub clusters: Arc<dyn ClusterRecommender>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub popular: Arc<dyn PopularItemsProvider>,
}

/// Composes hybrid recommendations from the configured sources.
///
/// Read-only with respect to every collaborator; dropping a `recommend`
/// future abandons in-flight source calls.
pub struct RecommendationComposer {
    collaborators: Collaborators,
    config: ComposerConfig,
    metrics: EngineMetrics,
}

impl RecommendationComposer {
    /// Creates a composer after validating `config`.
    pub fn new(collaborators: Collaborators, config: ComposerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            collaborators,
            config,
            metrics: global_metrics().clone(),
        })
    }

    /// Records into `metrics` instead of the global collector.
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Top `request.count` recommendations for `request.user_id`.
    ///
    /// Users without rating history (or when the rating store fails) receive
    /// popular items with score 0.0 in provider order.
    #[instrument(skip_all, fields(user_id = %request.user_id, count = request.count))]
    pub async fn recommend(&self, request: &RecommendationRequest) -> Vec<RecommendationCandidate> {
        if request.count == 0 {
            return Vec::new();
        }

        let start = Instant::now();
        let rated: HashSet<ItemId> = match self
            .collaborators
            .ratings
            .samples_for_user(request.user_id)
            .await
        {
            Ok(samples) => samples.into_iter().map(|s| s.item_id).collect(),
            Err(e) => {
                warn!(
                    "Rating store failed for user {}: {} (using popular items)",
                    request.user_id, e
                );
                HashSet::new()
            }
        };

        let candidates = if rated.is_empty() {
            self.popular_fallback(request).await
        } else {
            self.compose(request, &rated).await
        };

        self.metrics.record_compose(elapsed_ms(start));
        candidates
    }

    async fn compose(
        &self,
        request: &RecommendationRequest,
        rated: &HashSet<ItemId>,
    ) -> Vec<RecommendationCandidate> {
        let fetch = request.count.saturating_mul(SOURCE_OVERSAMPLE);
        let user_id = request.user_id;

        let user_source = self.run_source(
            CandidateSource::UserBased,
            self.collaborators.user_based.recommend(user_id, fetch),
        );
        let item_source = async {
            match request.anchor_item {
                Some(anchor) => {
                    self.run_source(
                        CandidateSource::ItemBased,
                        self.collaborators.item_based.recommend_similar(anchor, fetch),
                    )
                    .await
                }
                None => Vec::new(),
            }
        };
        let cluster_source = self.run_source(
            CandidateSource::ClusterBased,
            self.collaborators.clusters.recommend_from_cluster(user_id, fetch),
        );

        let (user_items, item_items, cluster_items) =
            tokio::join!(user_source, item_source, cluster_source);

        info!(
            "Sources returned {} user-based, {} item-based, {} cluster-based candidates",
            user_items.len(),
            item_items.len(),
            cluster_items.len()
        );

        let weights = self.config.weights;
        let merged = merge_weighted(&[
            (user_items.as_slice(), weights.user_based),
            (item_items.as_slice(), weights.item_based),
            (cluster_items.as_slice(), weights.cluster_based),
        ]);
        let unrated = merged
            .into_iter()
            .filter(|item| !rated.contains(&item.item_id))
            .collect();

        let filtered = self.filter_by_price(unrated, request.price_range).await;
        let ranked = normalize_and_rank(
            filtered,
            request.count,
            self.config.display_min,
            self.config.display_max,
        );

        self.attach_names(ranked).await
    }

    async fn popular_fallback(&self, request: &RecommendationRequest) -> Vec<RecommendationCandidate> {
        self.metrics.record_popular_fallback();

        let fetch = if request.price_range.is_some() {
            request.count.saturating_mul(SOURCE_OVERSAMPLE)
        } else {
            request.count
        };

        let popular = match self.collaborators.popular.top(fetch).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Popular items provider failed: {}", e);
                return Vec::new();
            }
        };
        debug!("Falling back to {} popular items", popular.len());

        let items = popular
            .into_iter()
            .map(|item_id| ScoredItem::new(item_id, 0.0))
            .collect();
        let mut filtered = self.filter_by_price(items, request.price_range).await;
        filtered.truncate(request.count);

        self.attach_names(filtered).await
    }

    /// Items similar to `item_id` from the item-based source alone, normalized
    /// and ranked like hybrid results.
    #[instrument(skip(self))]
    pub async fn similar_items(&self, item_id: ItemId, count: usize) -> Vec<RecommendationCandidate> {
        if count == 0 {
            return Vec::new();
        }

        let similar = self
            .run_source(
                CandidateSource::ItemBased,
                self.collaborators.item_based.recommend_similar(item_id, count),
            )
            .await;
        let ranked = normalize_and_rank(
            similar,
            count,
            self.config.display_min,
            self.config.display_max,
        );

        self.attach_names(ranked).await
    }

    /// Awaits one source under the configured timeout. Errors and timeouts
    /// are logged and yield an empty list; NaN and infinite scores are
    /// dropped.
    async fn run_source<F, E>(&self, source: CandidateSource, call: F) -> Vec<ScoredItem>
    where
        F: Future<Output = Result<Vec<ScoredItem>, E>>,
        E: Display,
    {
        match tokio::time::timeout(self.config.source_timeout(), call).await {
            Ok(Ok(mut items)) => {
                debug!("{} source returned {} items", source, items.len());
                let returned = items.len();
                items.retain(|item| item.score.is_finite());
                if items.len() < returned {
                    warn!(
                        "{} source returned {} non-finite scores (dropped)",
                        source,
                        returned - items.len()
                    );
                }
                items
            }
            Ok(Err(e)) => {
                warn!("{} source failed: {}", source, e);
                self.metrics.record_source_error(source);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "{} source timed out after {} ms",
                    source, self.config.source_timeout_ms
                );
                self.metrics.record_source_timeout(source);
                Vec::new()
            }
        }
    }

    /// Keeps items whose price lies in `range`. Items whose lookup fails are
    /// excluded. Order is preserved.
    async fn filter_by_price(&self, items: Vec<ScoredItem>, range: Option<PriceRange>) -> Vec<ScoredItem> {
        let Some(range) = range else {
            return items;
        };

        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            match self
                .collaborators
                .catalog
                .is_in_price_range(item.item_id, range.min, range.max)
                .await
            {
                Ok(true) => kept.push(item),
                Ok(false) => {}
                Err(e) => debug!("Excluding item {} (price lookup failed: {})", item.item_id, e),
            }
        }
        kept
    }

    async fn attach_names(&self, items: Vec<ScoredItem>) -> Vec<RecommendationCandidate> {
        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            let display_name = match self.collaborators.catalog.display_name(item.item_id).await {
                Ok(name) => name,
                Err(e) => {
                    debug!("No display name for item {}: {}", item.item_id, e);
                    format!("item-{}", item.item_id)
                }
            };
            candidates.push(RecommendationCandidate {
                item_id: item.item_id,
                display_name,
                score: item.score,
            });
        }
        candidates
    }
}
