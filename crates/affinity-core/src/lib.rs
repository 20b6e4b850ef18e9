//! # Affinity Core
//!
//! Hybrid recommendation and adaptive clustering engine for a storefront.
//!
//! Turns sparse user→item rating observations into ranked item suggestions by
//! combining external baseline recommenders with an incremental ART-style
//! clustering of users.
//!
//! ## Modules
//!
//! - [`similarity`] - Cosine and adjusted (mean-centered) cosine similarity
//! - [`ratings`] - Rating samples, the rating store collaborator, dense user vectors
//! - [`cluster`] - Cluster aggregates, cluster stores, and the ART cluster manager
//! - [`recommend`] - Collaborator traits, score fusion, the hybrid composer and its cache
//! - [`config`] - Default constants and validated engine configuration
//! - [`error`] - Error types shared across the engine
//! - [`metrics`] - Rolling latency metrics for assignment and composition

pub mod cluster;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ratings;
pub mod recommend;
pub mod similarity;

#[cfg(test)]
pub(crate) mod test_utils;
