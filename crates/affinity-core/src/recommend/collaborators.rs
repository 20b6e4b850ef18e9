//! Collaborator traits consumed by the composer, plus reference
//! implementations.
//!
//! The storefront normally supplies the baseline recommenders, the catalog
//! and the popular-items list. The implementations here let the engine run
//! end-to-end on nothing but a [`RatingStore`]:
//!
//! - [`NeighborhoodUserRecommender`]: user-based collaborative filtering over
//!   cosine similarity of dense user vectors
//! - [`AdjustedCosineItemRecommender`]: item-based neighbours by adjusted
//!   cosine similarity
//! - [`InMemoryCatalog`]: names and prices

use super::fusion::sort_by_score;
use super::types::ScoredItem;
use crate::error::{ClusterError, CollaboratorError};
use crate::ratings::{
    ItemId, ItemPreferences, ItemUniverse, RatingSample, RatingStore, UserId, UserVector,
};
use crate::similarity::{adjusted_cosine_batch, cosine_similarity, UserMeans};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// User-based baseline recommender.
#[async_trait]
pub trait BaselineUserRecommender: Send + Sync {
    /// Up to `count` items for `user_id`, best first.
    async fn recommend(
        &self,
        user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError>;
}

/// Item-based baseline recommender.
#[async_trait]
pub trait BaselineItemRecommender: Send + Sync {
    /// Up to `count` items similar to `item_id`, best first.
    async fn recommend_similar(
        &self,
        item_id: ItemId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError>;
}

/// Product catalog lookups.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn display_name(&self, item_id: ItemId) -> Result<String, CollaboratorError>;

    /// Whether the item's price lies in `[min, max]`.
    async fn is_in_price_range(
        &self,
        item_id: ItemId,
        min: f64,
        max: f64,
    ) -> Result<bool, CollaboratorError>;
}

/// Non-personalized fallback for users without history.
#[async_trait]
pub trait PopularItemsProvider: Send + Sync {
    /// Up to `count` item ids, most popular first.
    async fn top(&self, count: usize) -> Result<Vec<ItemId>, CollaboratorError>;
}

/// Cluster-based recommendation source (implemented by the ART manager).
#[async_trait]
pub trait ClusterRecommender: Send + Sync {
    async fn recommend_from_cluster(
        &self,
        user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, ClusterError>;
}

#[derive(Debug, Clone, PartialEq)]
struct CatalogEntry {
    name: String,
    price: f64,
}

/// In-memory catalog of item names and prices.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: HashMap<ItemId, CatalogEntry>,
}

impl InMemoryCatalog {
    /// Builds a catalog from `(id, name, price)` triples. Later duplicates win.
    pub fn new(entries: impl IntoIterator<Item = (ItemId, String, f64)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, name, price)| (id, CatalogEntry { name, price }))
                .collect(),
        }
    }

    pub fn name(&self, item_id: ItemId) -> Option<&str> {
        self.entries.get(&item_id).map(|e| e.name.as_str())
    }

    pub fn price(&self, item_id: ItemId) -> Option<f64> {
        self.entries.get(&item_id).map(|e| e.price)
    }

    /// All item ids, ascending.
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, item_id: ItemId) -> Result<&CatalogEntry, CollaboratorError> {
        self.entries
            .get(&item_id)
            .ok_or_else(|| CollaboratorError::Failed(format!("Unknown item {}", item_id)))
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn display_name(&self, item_id: ItemId) -> Result<String, CollaboratorError> {
        Ok(self.entry(item_id)?.name.clone())
    }

    async fn is_in_price_range(
        &self,
        item_id: ItemId,
        min: f64,
        max: f64,
    ) -> Result<bool, CollaboratorError> {
        let price = self.entry(item_id)?.price;
        Ok(price >= min && price <= max)
    }
}

/// User-based collaborative filtering.
///
/// Neighbours are the users who co-rated at least one item with the target,
/// ranked by cosine similarity of their dense rating vectors; the `k` most
/// similar (with positive similarity) vote. An unrated item's predicted
/// rating is the similarity-weighted average of the neighbours' ratings.
pub struct NeighborhoodUserRecommender {
    ratings: Arc<dyn RatingStore>,
    neighborhood_size: usize,
}

impl NeighborhoodUserRecommender {
    pub fn new(ratings: Arc<dyn RatingStore>, neighborhood_size: usize) -> Self {
        Self {
            ratings,
            neighborhood_size,
        }
    }

    async fn co_raters(
        &self,
        user_id: UserId,
        samples: &[RatingSample],
    ) -> Result<BTreeSet<UserId>, CollaboratorError> {
        let items: BTreeSet<ItemId> = samples.iter().map(|s| s.item_id).collect();
        let mut users = BTreeSet::new();
        for item_id in items {
            for sample in self.ratings.samples_for_item(item_id).await? {
                if sample.user_id != user_id {
                    users.insert(sample.user_id);
                }
            }
        }
        Ok(users)
    }
}

#[async_trait]
impl BaselineUserRecommender for NeighborhoodUserRecommender {
    async fn recommend(
        &self,
        user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError> {
        if count == 0 || self.neighborhood_size == 0 {
            return Ok(Vec::new());
        }

        let samples = self.ratings.samples_for_user(user_id).await?;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let universe = ItemUniverse::new(self.ratings.distinct_item_ids().await?);
        let target = UserVector::from_samples(user_id, &samples, &universe);

        let mut neighbours: Vec<(f64, UserVector)> = Vec::new();
        for other in self.co_raters(user_id, &samples).await? {
            let other_samples = self.ratings.samples_for_user(other).await?;
            let vector = UserVector::from_samples(other, &other_samples, &universe);
            let similarity = cosine_similarity(target.values(), vector.values());
            if similarity > 0.0 {
                neighbours.push((similarity, vector));
            }
        }
        neighbours.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.user_id().cmp(&b.1.user_id()))
        });
        neighbours.truncate(self.neighborhood_size);

        let mut predictions = Vec::new();
        for (slot, &own) in target.values().iter().enumerate() {
            if own != 0.0 {
                continue;
            }
            let (weighted, total) = neighbours
                .iter()
                .filter(|(_, v)| v.values()[slot] != 0.0)
                .fold((0.0, 0.0), |(weighted, total), (sim, v)| {
                    (weighted + sim * v.values()[slot], total + sim)
                });
            if total > 0.0 {
                if let Some(item_id) = universe.item_at(slot) {
                    predictions.push(ScoredItem::new(item_id, weighted / total));
                }
            }
        }

        sort_by_score(&mut predictions);
        predictions.truncate(count);
        debug!(
            "User-based: {} neighbours, {} predictions for user {}",
            neighbours.len(),
            predictions.len(),
            user_id
        );
        Ok(predictions)
    }
}

/// Item-based neighbours by adjusted cosine similarity.
///
/// Every other known item is compared against the anchor; undefined pairs
/// (no co-raters, zero variance) and non-positive similarities are dropped.
pub struct AdjustedCosineItemRecommender {
    ratings: Arc<dyn RatingStore>,
}

impl AdjustedCosineItemRecommender {
    pub fn new(ratings: Arc<dyn RatingStore>) -> Self {
        Self { ratings }
    }

    async fn means_for(&self, reference: &ItemPreferences) -> Result<UserMeans, CollaboratorError> {
        let mut samples = Vec::new();
        for preference in reference.preferences() {
            samples.extend(self.ratings.samples_for_user(preference.user_id).await?);
        }
        Ok(UserMeans::from_samples(&samples))
    }
}

#[async_trait]
impl BaselineItemRecommender for AdjustedCosineItemRecommender {
    async fn recommend_similar(
        &self,
        item_id: ItemId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let reference_samples = self.ratings.samples_for_item(item_id).await?;
        let reference = ItemPreferences::from_samples(item_id, &reference_samples);
        if reference.is_empty() {
            return Ok(Vec::new());
        }
        let means = self.means_for(&reference).await?;

        let mut candidates = Vec::new();
        for other in self.ratings.distinct_item_ids().await? {
            if other == item_id {
                continue;
            }
            let samples = self.ratings.samples_for_item(other).await?;
            candidates.push(ItemPreferences::from_samples(other, &samples));
        }

        let mut similar: Vec<ScoredItem> = adjusted_cosine_batch(&reference, &candidates, &means)
            .into_iter()
            .filter(|(_, similarity)| *similarity > 0.0)
            .map(|(id, similarity)| ScoredItem::new(id, similarity))
            .collect();

        sort_by_score(&mut similar);
        similar.truncate(count);
        Ok(similar)
    }
}
