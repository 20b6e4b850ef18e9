//! Redb-backed cluster store for desktop and CLI use.
//!
//! Uses [redb](https://github.com/cberner/redb) - a pure Rust, ACID-compliant,
//! embedded B-tree database.
//!
//! # Tables
//!
//! - `weights`: ClusterId (u64) -> prototype `Vec<f64>` (raw bytes, little-endian)
//! - `members`: ClusterId (u64) -> `Vec<MemberRecord>` (JSON)
//! - `metadata`: key (string) -> value (raw bytes) - next cluster id and the
//!   item axis (item ids as little-endian u64, in slot order)
//!
//! Keys are ascending cluster ids, so table iteration order is creation order.

use super::store::{append_new_items, ClusterStore, StoreError};
use super::types::{Cluster, ClusterId};
use crate::ratings::{ItemId, UserId};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

// Table definitions
const WEIGHTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("weights");
const MEMBERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("members");
const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

// Metadata keys
const NEXT_ID_KEY: &str = "next_cluster_id";
const ITEM_AXIS_KEY: &str = "item_axis";

/// Persisted member entry.
#[derive(Debug, Serialize, Deserialize)]
struct MemberRecord {
    user_id: UserId,
    vector: Vec<f64>,
}

/// Redb-backed cluster store.
///
/// Every operation runs in its own redb transaction. A `create` allocates the
/// id and writes the cluster in a single write transaction, so a crash never
/// leaves a half-created cluster.
///
/// # Example
///
/// ```ignore
/// use affinity_core::cluster::RedbClusterStore;
///
/// let store = RedbClusterStore::open("./data/clusters.redb")?;
/// let clusters = store.find_all().await?;
/// ```
pub struct RedbClusterStore {
    db: Arc<Database>,
}

impl RedbClusterStore {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates the database file and all required tables if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| StoreError::DatabaseError(format!("Failed to open database: {}", e)))?;

        {
            let write_txn = db.begin_write().map_err(|e| {
                StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
            })?;

            write_txn.open_table(WEIGHTS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to create weights table: {}", e))
            })?;
            write_txn.open_table(MEMBERS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to create members table: {}", e))
            })?;
            write_txn.open_table(METADATA_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to create metadata table: {}", e))
            })?;

            write_txn.commit().map_err(|e| {
                StoreError::DatabaseError(format!("Failed to commit table creation: {}", e))
            })?;
        }

        Ok(Self { db: Arc::new(db) })
    }

    /// Serializes a prototype to raw bytes.
    ///
    /// Format: little-endian f64 values packed sequentially (8 bytes per
    /// value). Bit-exact, which `find_by_weights` depends on.
    fn serialize_weights(weights: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(weights.len() * 8);
        for &val in weights {
            bytes.extend_from_slice(&val.to_le_bytes());
        }
        bytes
    }

    /// Deserializes a prototype from raw bytes.
    fn deserialize_weights(bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect()
    }

    fn serialize_axis(axis: &[ItemId]) -> Vec<u8> {
        axis.iter().flat_map(|item| item.as_u64().to_le_bytes()).collect()
    }

    fn deserialize_axis(bytes: &[u8]) -> Vec<ItemId> {
        bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                ItemId::from_u64(u64::from_le_bytes(buf))
            })
            .collect()
    }

    /// Reads the item axis from an open metadata table.
    fn read_axis(
        metadata: &impl ReadableTable<&'static str, &'static [u8]>,
    ) -> Result<Vec<ItemId>, StoreError> {
        match metadata.get(ITEM_AXIS_KEY) {
            Ok(Some(guard)) => Ok(Self::deserialize_axis(guard.value())),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(StoreError::DatabaseError(format!(
                "Failed to read item axis: {}",
                e
            ))),
        }
    }

    /// Serializes cluster members to JSON bytes.
    fn serialize_members(cluster: &Cluster) -> Result<Vec<u8>, StoreError> {
        let records: Vec<MemberRecord> = cluster
            .members()
            .iter()
            .map(|(user_id, vector)| MemberRecord {
                user_id: *user_id,
                vector: vector.clone(),
            })
            .collect();
        serde_json::to_vec(&records).map_err(|e| {
            StoreError::SerializationError(format!("Failed to serialize members: {}", e))
        })
    }

    /// Deserializes cluster members from JSON bytes.
    fn deserialize_members(bytes: &[u8]) -> Result<BTreeMap<UserId, Vec<f64>>, StoreError> {
        let records: Vec<MemberRecord> = serde_json::from_slice(bytes).map_err(|e| {
            StoreError::SerializationError(format!("Failed to deserialize members: {}", e))
        })?;
        Ok(records
            .into_iter()
            .map(|record| (record.user_id, record.vector))
            .collect())
    }

    /// Writes weights and members of `cluster` inside an open write transaction.
    fn write_cluster(write_txn: &redb::WriteTransaction, cluster: &Cluster) -> Result<(), StoreError> {
        let weights = Self::serialize_weights(cluster.weights());
        let members = Self::serialize_members(cluster)?;
        let key = cluster.id().as_u64();

        let mut weights_table = write_txn.open_table(WEIGHTS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open weights table: {}", e))
        })?;
        weights_table
            .insert(key, weights.as_slice())
            .map_err(|e| StoreError::DatabaseError(format!("Failed to insert weights: {}", e)))?;

        let mut members_table = write_txn.open_table(MEMBERS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open members table: {}", e))
        })?;
        members_table
            .insert(key, members.as_slice())
            .map_err(|e| StoreError::DatabaseError(format!("Failed to insert members: {}", e)))?;

        Ok(())
    }

    /// Loads every cluster, optionally stopping at the first prototype match.
    fn load_clusters(&self, only_weights: Option<&[f64]>) -> Result<Vec<Cluster>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let weights_table = read_txn.open_table(WEIGHTS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open weights table: {}", e))
        })?;
        let members_table = read_txn.open_table(MEMBERS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open members table: {}", e))
        })?;

        let iter = weights_table
            .iter()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to iterate weights: {}", e)))?;

        let mut clusters = Vec::new();
        for result in iter {
            let (key, value) = result.map_err(|e| {
                StoreError::DatabaseError(format!("Failed to read weights entry: {}", e))
            })?;
            let id = key.value();
            let weights = Self::deserialize_weights(value.value());

            if let Some(target) = only_weights {
                if weights.as_slice() != target {
                    continue;
                }
            }

            let members = match members_table.get(id) {
                Ok(Some(guard)) => Self::deserialize_members(guard.value())?,
                Ok(None) => {
                    warn!("Cluster {} has weights but no member record", id);
                    BTreeMap::new()
                }
                Err(e) => {
                    return Err(StoreError::DatabaseError(format!(
                        "Failed to get members: {}",
                        e
                    )))
                }
            };

            clusters.push(Cluster::from_parts(ClusterId::from_u64(id), weights, members));
            if only_weights.is_some() {
                break;
            }
        }

        Ok(clusters)
    }
}

#[async_trait::async_trait]
impl ClusterStore for RedbClusterStore {
    async fn create(
        &self,
        weights: Vec<f64>,
        member: UserId,
        member_vector: Vec<f64>,
    ) -> Result<Cluster, StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        let cluster = {
            let mut metadata = write_txn.open_table(METADATA_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open metadata table: {}", e))
            })?;

            let next_id = match metadata.get(NEXT_ID_KEY) {
                Ok(Some(guard)) => {
                    let bytes = guard.value();
                    let buf: [u8; 8] = bytes.try_into().map_err(|_| {
                        StoreError::SerializationError(format!(
                            "Corrupt next id ({} bytes)",
                            bytes.len()
                        ))
                    })?;
                    u64::from_le_bytes(buf)
                }
                Ok(None) => 0,
                Err(e) => {
                    return Err(StoreError::DatabaseError(format!(
                        "Failed to read next id: {}",
                        e
                    )))
                }
            };

            metadata
                .insert(NEXT_ID_KEY, next_id.saturating_add(1).to_le_bytes().as_slice())
                .map_err(|e| StoreError::DatabaseError(format!("Failed to bump next id: {}", e)))?;

            Cluster::new(ClusterId::from_u64(next_id), weights, member, member_vector)
        };

        Self::write_cluster(&write_txn, &cluster)?;

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit cluster: {}", e)))?;

        Ok(cluster)
    }

    async fn find_all(&self) -> Result<Vec<Cluster>, StoreError> {
        self.load_clusters(None)
    }

    async fn find_by_weights(&self, weights: &[f64]) -> Result<Option<Cluster>, StoreError> {
        Ok(self.load_clusters(Some(weights))?.into_iter().next())
    }

    async fn save(&self, cluster: &Cluster) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let weights_table = write_txn.open_table(WEIGHTS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open weights table: {}", e))
            })?;
            let exists = weights_table
                .get(cluster.id().as_u64())
                .map_err(|e| StoreError::DatabaseError(format!("Failed to get weights: {}", e)))?
                .is_some();
            if !exists {
                return Err(StoreError::NotFound(format!("cluster {}", cluster.id())));
            }
        }

        Self::write_cluster(&write_txn, cluster)?;

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit cluster: {}", e)))?;

        Ok(())
    }

    async fn cluster_count(&self) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(WEIGHTS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open weights table: {}", e))
        })?;

        let count = table
            .len()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to get cluster count: {}", e)))?;

        Ok(count as usize)
    }

    async fn item_axis(&self) -> Result<Vec<ItemId>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;
        let metadata = read_txn.open_table(METADATA_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open metadata table: {}", e))
        })?;
        Self::read_axis(&metadata)
    }

    async fn extend_item_axis(&self, items: &[ItemId]) -> Result<Vec<ItemId>, StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        let axis = {
            let mut metadata = write_txn.open_table(METADATA_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open metadata table: {}", e))
            })?;
            let mut axis = Self::read_axis(&metadata)?;
            let known = axis.len();
            append_new_items(&mut axis, items);

            if axis.len() > known {
                metadata
                    .insert(ITEM_AXIS_KEY, Self::serialize_axis(&axis).as_slice())
                    .map_err(|e| {
                        StoreError::DatabaseError(format!("Failed to write item axis: {}", e))
                    })?;
            }
            axis
        };

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit item axis: {}", e)))?;

        Ok(axis)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        // Helper to clear a table with u64 keys
        fn clear_u64_table(
            write_txn: &redb::WriteTransaction,
            table_def: TableDefinition<u64, &[u8]>,
            table_name: &str,
        ) -> Result<usize, StoreError> {
            let mut table = write_txn.open_table(table_def).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open {} table: {}", table_name, e))
            })?;
            let keys: Vec<u64> = table
                .iter()
                .map_err(|e| {
                    StoreError::DatabaseError(format!("Failed to iterate {}: {}", table_name, e))
                })?
                .filter_map(|r| r.ok().map(|(k, _)| k.value()))
                .collect();
            let mut removed = 0;
            for key in &keys {
                if let Err(e) = table.remove(*key) {
                    warn!(
                        "Failed to remove key {} from {}: {} (continuing)",
                        key, table_name, e
                    );
                } else {
                    removed += 1;
                }
            }
            Ok(removed)
        }

        let removed = clear_u64_table(&write_txn, WEIGHTS_TABLE, "weights")?;
        clear_u64_table(&write_txn, MEMBERS_TABLE, "members")?;

        {
            let mut metadata = write_txn.open_table(METADATA_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open metadata table: {}", e))
            })?;
            metadata
                .remove(NEXT_ID_KEY)
                .map_err(|e| StoreError::DatabaseError(format!("Failed to reset next id: {}", e)))?;
            metadata.remove(ITEM_AXIS_KEY).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to reset item axis: {}", e))
            })?;
        }

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit clear: {}", e)))?;

        tracing::info!("Cleared {} clusters", removed);
        Ok(())
    }
}
