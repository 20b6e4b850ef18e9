//! Cluster store trait and in-memory implementation.
//!
//! The [`ClusterStore`] persists [`Cluster`] aggregates and owns cluster
//! identity. Clusters are append-only: they are created and saved, never
//! deleted during normal operation.
//!
//! The store also owns the item axis: the append-only list of item ids that
//! gives every stored prototype and member vector its slot layout. Items
//! are only ever appended, so a vector written against an older, shorter
//! axis stays valid once zero-padded.
//!
//! - **Tests / ephemeral use**: [`InMemoryClusterStore`]
//! - **Desktop / CLI**: `RedbClusterStore` (feature `redb-store`)

use super::types::{Cluster, ClusterId};
use crate::ratings::{ItemId, UserId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;

/// Errors that can occur during cluster store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Cluster not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error (filesystem)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error (redb, lock poisoning)
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Persistent collection of clusters.
///
/// # Design Notes
///
/// - Cluster ids are allocated by the store, ascending in creation order.
/// - `find_all` returns clusters in creation order; the ART resonance scan
///   relies on it for its first-match tie-break.
/// - `find_by_weights` is exact floating-point equality on the prototype.
///   `ArtClusterManager` uses it as the re-creation check before `create`;
///   other callers that create clusters directly own that check.
/// - Slot `i` of every stored vector belongs to item `item_axis()[i]`.
/// - Each call is self-contained; callers that need scan-then-mutate
///   atomicity serialize externally (see `ArtClusterManager`).
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Allocates a new cluster id and persists a cluster with one member.
    async fn create(
        &self,
        weights: Vec<f64>,
        member: UserId,
        member_vector: Vec<f64>,
    ) -> Result<Cluster, StoreError>;

    /// Returns every cluster in creation order.
    async fn find_all(&self) -> Result<Vec<Cluster>, StoreError>;

    /// Returns the cluster whose prototype equals `weights` exactly.
    ///
    /// Not suitable for approximate matching.
    async fn find_by_weights(&self, weights: &[f64]) -> Result<Option<Cluster>, StoreError>;

    /// Persists the prototype and members of an existing cluster.
    ///
    /// Returns `StoreError::NotFound` if the cluster id was never created.
    async fn save(&self, cluster: &Cluster) -> Result<(), StoreError>;

    /// Returns the number of clusters.
    async fn cluster_count(&self) -> Result<usize, StoreError>;

    /// Returns the item axis in slot order.
    async fn item_axis(&self) -> Result<Vec<ItemId>, StoreError>;

    /// Appends the items not yet on the axis, in the given order, and returns
    /// the full axis.
    async fn extend_item_axis(&self, items: &[ItemId]) -> Result<Vec<ItemId>, StoreError>;

    /// Removes every cluster, resets id allocation and empties the item axis.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Appends the entries of `items` missing from `axis`, keeping their order.
pub(crate) fn append_new_items(axis: &mut Vec<ItemId>, items: &[ItemId]) {
    let mut known: HashSet<ItemId> = axis.iter().copied().collect();
    for &item_id in items {
        if known.insert(item_id) {
            axis.push(item_id);
        }
    }
}

/// In-memory cluster store for testing and ephemeral engines.
///
/// Clusters live in a `Vec` indexed by id, so creation order is index order.
#[derive(Default)]
pub struct InMemoryClusterStore {
    clusters: RwLock<Vec<Cluster>>,
    axis: RwLock<Vec<ItemId>>,
}

impl InMemoryClusterStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn create(
        &self,
        weights: Vec<f64>,
        member: UserId,
        member_vector: Vec<f64>,
    ) -> Result<Cluster, StoreError> {
        let mut clusters = self
            .clusters
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let id = ClusterId::from_u64(clusters.len() as u64);
        let cluster = Cluster::new(id, weights, member, member_vector);
        clusters.push(cluster.clone());
        Ok(cluster)
    }

    async fn find_all(&self) -> Result<Vec<Cluster>, StoreError> {
        let clusters = self
            .clusters
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(clusters.clone())
    }

    async fn find_by_weights(&self, weights: &[f64]) -> Result<Option<Cluster>, StoreError> {
        let clusters = self
            .clusters
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(clusters.iter().find(|c| c.weights() == weights).cloned())
    }

    async fn save(&self, cluster: &Cluster) -> Result<(), StoreError> {
        let mut clusters = self
            .clusters
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let slot = clusters
            .get_mut(cluster.id().as_u64() as usize)
            .ok_or_else(|| StoreError::NotFound(format!("cluster {}", cluster.id())))?;
        *slot = cluster.clone();
        Ok(())
    }

    async fn cluster_count(&self) -> Result<usize, StoreError> {
        let clusters = self
            .clusters
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(clusters.len())
    }

    async fn item_axis(&self) -> Result<Vec<ItemId>, StoreError> {
        let axis = self
            .axis
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(axis.clone())
    }

    async fn extend_item_axis(&self, items: &[ItemId]) -> Result<Vec<ItemId>, StoreError> {
        let mut axis = self
            .axis
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        append_new_items(&mut axis, items);
        Ok(axis.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut clusters = self
            .clusters
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        clusters.clear();
        self.axis
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?
            .clear();
        Ok(())
    }
}
