//! Adaptive user clustering.
//!
//! Users are grouped by the similarity of their rating vectors using an
//! ART-style protocol: a vigilance test decides whether a user resonates with
//! an existing cluster prototype, and resonating prototypes adapt toward their
//! new members.
//!
//! # Architecture
//!
//! - [`ArtClusterManager`]: resonance scan, weight adaptation and cluster-based
//!   recommendation, serialized by a single assignment lock
//! - [`ClusterStore`]: persistence trait, with [`InMemoryClusterStore`] and
//!   (feature `redb-store`) `RedbClusterStore`
//! - [`Cluster`], [`Vigilance`], [`Assignment`]: the aggregate and its
//!   parameters

mod art;
mod store;
mod types;

#[cfg(feature = "redb-store")]
mod redb_store;

pub use art::ArtClusterManager;
pub use store::{ClusterStore, InMemoryClusterStore, StoreError};
pub use types::{Assignment, Cluster, ClusterId, Vigilance};

#[cfg(feature = "redb-store")]
pub use redb_store::RedbClusterStore;
