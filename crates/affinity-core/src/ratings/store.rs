//! Rating store collaborator.
//!
//! The storefront owns rating persistence; the engine only reads through the
//! [`RatingStore`] trait. [`InMemoryRatingStore`] is a reference
//! implementation used by the CLI and tests.

use super::types::{ItemId, RatingSample, UserId};
use crate::error::CollaboratorError;
use crate::recommend::PopularItemsProvider;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// Read access to the storefront's rating samples.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the composer queries the store from
/// concurrently running recommendation requests.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// All samples recorded for `user_id`, in recording order.
    async fn samples_for_user(&self, user_id: UserId) -> Result<Vec<RatingSample>, CollaboratorError>;

    /// All samples recorded for `item_id`, in recording order.
    async fn samples_for_item(&self, item_id: ItemId) -> Result<Vec<RatingSample>, CollaboratorError>;

    /// Every item id known to the system, ascending.
    async fn distinct_item_ids(&self) -> Result<Vec<ItemId>, CollaboratorError>;
}

#[derive(Default)]
struct RatingTables {
    by_user: HashMap<UserId, Vec<RatingSample>>,
    by_item: HashMap<ItemId, Vec<RatingSample>>,
    items: BTreeSet<ItemId>,
}

/// In-memory rating store.
///
/// Also acts as a [`PopularItemsProvider`]: popularity is the number of
/// samples recorded for an item, ties broken by ascending item id.
#[derive(Default)]
pub struct InMemoryRatingStore {
    tables: RwLock<RatingTables>,
}

impl InMemoryRatingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `samples`.
    pub fn with_samples(samples: impl IntoIterator<Item = RatingSample>) -> Self {
        let store = Self::new();
        for sample in samples {
            // A fresh lock cannot be poisoned
            let _ = store.record(sample);
        }
        store
    }

    /// Records a new rating sample.
    pub fn record(&self, sample: RatingSample) -> Result<(), CollaboratorError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        tables.items.insert(sample.item_id);
        tables
            .by_item
            .entry(sample.item_id)
            .or_default()
            .push(sample.clone());
        tables.by_user.entry(sample.user_id).or_default().push(sample);
        Ok(())
    }

    /// Registers an item that has no ratings yet (e.g. a new catalog listing).
    pub fn register_item(&self, item_id: ItemId) -> Result<(), CollaboratorError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        tables.items.insert(item_id);
        Ok(())
    }

    /// All user ids with at least one sample, ascending.
    pub fn user_ids(&self) -> Result<Vec<UserId>, CollaboratorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        let mut users: Vec<UserId> = tables.by_user.keys().copied().collect();
        users.sort();
        Ok(users)
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn samples_for_user(&self, user_id: UserId) -> Result<Vec<RatingSample>, CollaboratorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        Ok(tables.by_user.get(&user_id).cloned().unwrap_or_default())
    }

    async fn samples_for_item(&self, item_id: ItemId) -> Result<Vec<RatingSample>, CollaboratorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        Ok(tables.by_item.get(&item_id).cloned().unwrap_or_default())
    }

    async fn distinct_item_ids(&self) -> Result<Vec<ItemId>, CollaboratorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;
        Ok(tables.items.iter().copied().collect())
    }
}

#[async_trait]
impl PopularItemsProvider for InMemoryRatingStore {
    async fn top(&self, count: usize) -> Result<Vec<ItemId>, CollaboratorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CollaboratorError::Failed(format!("Lock poisoned: {}", e)))?;

        let mut ranked: Vec<(ItemId, usize)> = tables
            .by_item
            .iter()
            .map(|(item, samples)| (*item, samples.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(ranked.into_iter().take(count).map(|(item, _)| item).collect())
    }
}
