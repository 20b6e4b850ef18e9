//! Error types for affinity-core.
//!
//! This module defines the errors shared across the engine: user vector
//! construction, collaborator calls, cluster assignment, and configuration.
//! Storage errors live next to the store trait in [`crate::cluster`].

use crate::cluster::StoreError;
use crate::ratings::UserId;
use thiserror::Error;

/// Errors that can occur while building a user vector.
#[derive(Debug, Clone, Error)]
pub enum VectorError {
    /// The user has no rating samples, so there is nothing to cluster.
    ///
    /// Recoverable: callers fall back to a non-personalized recommender.
    #[error("No rating data for user {0}")]
    NoRatingData(UserId),
    /// The rating store failed while fetching samples or the item universe
    #[error("Rating store error: {0}")]
    Ratings(String),
}

/// Errors reported by external collaborators (rating store, baseline
/// recommenders, catalog, popular-items provider).
///
/// The composer recovers these locally and never propagates them.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// Collaborator is not reachable or not configured
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    /// Collaborator call failed
    #[error("Collaborator call failed: {0}")]
    Failed(String),
    /// Collaborator did not answer within the configured timeout
    #[error("Collaborator timed out after {0} ms")]
    Timeout(u64),
}

/// Errors that can occur during cluster assignment or cluster-based
/// recommendation.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    /// Cluster store failure (fatal for the in-flight assignment only)
    #[error("Cluster store error: {0}")]
    Store(String),
    /// User vector could not be built
    #[error(transparent)]
    Vector(#[from] VectorError),
    /// Input vector is shorter than an existing cluster prototype
    #[error("Dimension mismatch: cluster has {expected} dimensions, vector has {actual}")]
    DimensionMismatch {
        /// Dimensionality of the cluster prototype
        expected: usize,
        /// Dimensionality of the rejected vector
        actual: usize,
    },
    /// Invalid clustering parameter (vigilance, learning rate)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Conversion implementations for error chaining

impl From<StoreError> for ClusterError {
    fn from(err: StoreError) -> Self {
        ClusterError::Store(err.to_string())
    }
}

impl From<CollaboratorError> for VectorError {
    fn from(err: CollaboratorError) -> Self {
        VectorError::Ratings(err.to_string())
    }
}

impl From<ConfigError> for ClusterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(msg) => ClusterError::InvalidParameter(msg),
        }
    }
}
