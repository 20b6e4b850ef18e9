//! Dense user vectors.
//!
//! A [`UserVector`] holds one slot per known item with the user's rating, or
//! 0.0 for unrated items. Vectors are transient: they are rebuilt on demand
//! and must be rebuilt whenever the item universe grows.
//!
//! Slot order comes from the [`ItemUniverse`]: ascending item id for a
//! universe built with [`ItemUniverse::new`], first-seen order for one built
//! with [`ItemUniverse::from_axis`]. Stored cluster vectors use the latter so
//! that a newly rated item always lands in a trailing slot.

use super::store::RatingStore;
use super::types::{ItemId, RatingSample, UserId};
use crate::error::VectorError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The ordered set of item ids that defines vector dimensions.
///
/// Slot `i` of every vector built against this universe holds the rating of
/// `item_at(i)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemUniverse {
    items: Vec<ItemId>,
    slots: HashMap<ItemId, usize>,
}

impl ItemUniverse {
    /// Builds a universe from item ids in any order, sorted ascending;
    /// duplicates are dropped.
    pub fn new(mut items: Vec<ItemId>) -> Self {
        items.sort();
        items.dedup();
        Self::from_axis(items)
    }

    /// Builds a universe that keeps the given slot order. Later duplicates
    /// are dropped.
    pub fn from_axis(axis: Vec<ItemId>) -> Self {
        let mut items = Vec::with_capacity(axis.len());
        let mut slots = HashMap::with_capacity(axis.len());
        for item_id in axis {
            if !slots.contains_key(&item_id) {
                slots.insert(item_id, items.len());
                items.push(item_id);
            }
        }
        Self { items, slots }
    }

    /// Slot index of `item_id`, if it is part of the universe.
    pub fn index_of(&self, item_id: ItemId) -> Option<usize> {
        self.slots.get(&item_id).copied()
    }

    /// Item id stored at slot `index`.
    pub fn item_at(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }
}

/// A user's ratings laid out densely over an [`ItemUniverse`].
#[derive(Debug, Clone, PartialEq)]
pub struct UserVector {
    user_id: UserId,
    values: Vec<f64>,
}

impl UserVector {
    /// Wraps raw values (one per universe slot).
    pub fn new(user_id: UserId, values: Vec<f64>) -> Self {
        Self { user_id, values }
    }

    /// Lays out `samples` over `universe`.
    ///
    /// When the same item was rated more than once, the latest sample wins.
    /// Samples for items outside the universe are skipped.
    pub fn from_samples(user_id: UserId, samples: &[RatingSample], universe: &ItemUniverse) -> Self {
        let mut values = vec![0.0; universe.len()];
        let mut stamps: HashMap<usize, u64> = HashMap::new();

        for sample in samples.iter().filter(|s| s.user_id == user_id) {
            let Some(index) = universe.index_of(sample.item_id) else {
                warn!(
                    "Skipping rating of user {} for item {} outside the item universe",
                    user_id, sample.item_id
                );
                continue;
            };
            let newer = stamps
                .get(&index)
                .is_none_or(|&seen| sample.timestamp >= seen);
            if newer {
                stamps.insert(index, sample.timestamp);
                values[index] = sample.rating;
            }
        }

        Self { user_id, values }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Dimensionality (size of the universe the vector was built against).
    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

/// Builds dense user vectors from the rating store.
#[derive(Clone)]
pub struct UserVectorBuilder {
    ratings: Arc<dyn RatingStore>,
}

impl UserVectorBuilder {
    pub fn new(ratings: Arc<dyn RatingStore>) -> Self {
        Self { ratings }
    }

    /// Fetches the current item universe from the rating store.
    pub async fn universe(&self) -> Result<ItemUniverse, VectorError> {
        let items = self.ratings.distinct_item_ids().await?;
        Ok(ItemUniverse::new(items))
    }

    /// Builds the vector of `user_id` against the current item universe.
    ///
    /// # Errors
    ///
    /// Returns `VectorError::NoRatingData` if the user has no samples; callers
    /// should fall back to a non-personalized recommender.
    pub async fn build_vector(&self, user_id: UserId) -> Result<UserVector, VectorError> {
        let universe = self.universe().await?;
        self.build_with_universe(user_id, &universe).await
    }

    /// Builds the vector of `user_id` against a universe the caller already holds.
    pub async fn build_with_universe(
        &self,
        user_id: UserId,
        universe: &ItemUniverse,
    ) -> Result<UserVector, VectorError> {
        let samples = self.ratings.samples_for_user(user_id).await?;
        if samples.is_empty() {
            return Err(VectorError::NoRatingData(user_id));
        }

        let vector = UserVector::from_samples(user_id, &samples, universe);
        debug!(
            "Built vector for user {} from {} samples ({} dimensions)",
            user_id,
            samples.len(),
            vector.dim()
        );
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::InMemoryRatingStore;
    use crate::test_utils::{rating, rating_at};

    fn item(id: u64) -> ItemId {
        ItemId::from_u64(id)
    }

    #[test]
    fn test_universe_sorted_and_deduplicated() {
        let universe = ItemUniverse::new(vec![item(3), item(1), item(3), item(2)]);
        assert_eq!(universe.items(), &[item(1), item(2), item(3)]);
        assert_eq!(universe.index_of(item(2)), Some(1));
        assert_eq!(universe.index_of(item(9)), None);
        assert_eq!(universe.item_at(2), Some(item(3)));
    }

    #[test]
    fn test_axis_keeps_first_seen_order() {
        let universe = ItemUniverse::from_axis(vec![item(10), item(20), item(5), item(10)]);
        assert_eq!(universe.items(), &[item(10), item(20), item(5)]);
        assert_eq!(universe.index_of(item(5)), Some(2));
        assert_eq!(universe.item_at(0), Some(item(10)));
    }

    #[tokio::test]
    async fn test_build_vector_places_ratings_by_item() {
        let store = InMemoryRatingStore::with_samples(vec![
            rating(1, 10, 5.0),
            rating(1, 30, 2.0),
            rating(2, 20, 4.0),
        ]);
        let builder = UserVectorBuilder::new(Arc::new(store));

        let vector = builder.build_vector(UserId::from_u64(1)).await.unwrap();
        assert_eq!(vector.values(), &[5.0, 0.0, 2.0]);
        assert_eq!(vector.dim(), 3);
    }

    #[tokio::test]
    async fn test_build_vector_no_rating_data() {
        let store = InMemoryRatingStore::with_samples(vec![rating(1, 10, 5.0)]);
        let builder = UserVectorBuilder::new(Arc::new(store));

        let result = builder.build_vector(UserId::from_u64(2)).await;
        assert!(matches!(result, Err(VectorError::NoRatingData(u)) if u.as_u64() == 2));
    }

    #[tokio::test]
    async fn test_latest_rating_wins() {
        let store = InMemoryRatingStore::with_samples(vec![
            rating_at(1, 10, 1.0, 100),
            rating_at(1, 10, 4.0, 300),
            rating_at(1, 10, 2.0, 200),
        ]);
        let builder = UserVectorBuilder::new(Arc::new(store));

        let vector = builder.build_vector(UserId::from_u64(1)).await.unwrap();
        assert_eq!(vector.values(), &[4.0]);
    }

    #[test]
    fn test_samples_outside_universe_skipped() {
        let universe = ItemUniverse::new(vec![item(1)]);
        let samples = vec![rating(7, 1, 3.0), rating(7, 2, 5.0)];
        let vector = UserVector::from_samples(UserId::from_u64(7), &samples, &universe);
        assert_eq!(vector.values(), &[3.0]);
    }

    #[tokio::test]
    async fn test_vector_grows_with_universe() {
        let store = Arc::new(InMemoryRatingStore::with_samples(vec![rating(1, 10, 5.0)]));
        let builder = UserVectorBuilder::new(store.clone());

        let before = builder.build_vector(UserId::from_u64(1)).await.unwrap();
        store.register_item(item(11)).unwrap();
        let after = builder.build_vector(UserId::from_u64(1)).await.unwrap();

        assert_eq!(before.values(), &[5.0]);
        assert_eq!(after.values(), &[5.0, 0.0]);
    }
}
