//! Hybrid recommendation.
//!
//! Combines three sources into one ranked list:
//! - **User-based** collaborative filtering (a [`BaselineUserRecommender`])
//! - **Item-based** neighbours of an anchor item (a [`BaselineItemRecommender`])
//! - **Cluster-based** suggestions from ART cluster co-members (a
//!   [`ClusterRecommender`], implemented by
//!   [`ArtClusterManager`](crate::cluster::ArtClusterManager))
//!
//! # Architecture
//!
//! - `types`: ScoredItem, RecommendationCandidate, RecommendationRequest, PriceRange
//! - `collaborators`: Collaborator traits and reference implementations
//! - `fusion`: Weighted merge, min-max normalization, ranking
//! - `composer`: RecommendationComposer orchestrating the sources
//! - `cache`: CachedComposer memoizing composer results
//!
//! # Usage
//!
//! ```ignore
//! use affinity_core::recommend::{Collaborators, RecommendationComposer, RecommendationRequest};
//!
//! let composer = RecommendationComposer::new(collaborators, ComposerConfig::default())?;
//! let request = RecommendationRequest::new(user_id, 10).with_anchor(item_id);
//! for candidate in composer.recommend(&request).await {
//!     println!("{} ({:.1})", candidate.display_name, candidate.score);
//! }
//! ```
//!
//! # Algorithm Details
//!
//! **Weighted merge**:
//! - `score(i) = Σ weight_s · score_s(i)` over the sources that returned `i`
//! - Default weights 0.4 (user), 0.3 (item), 0.3 (cluster)
//!
//! **Normalization**:
//! - Min-max into the display range `[0.1, 9.9]`
//! - A list whose scores are all equal maps to the midpoint (5.0)
//!
//! **Fallback**:
//! - Users without rating history get the popular-items list, score 0.0

mod cache;
mod collaborators;
mod composer;
pub mod fusion;
mod types;

pub use cache::{CacheStats, CachedComposer};
pub use collaborators::{
    AdjustedCosineItemRecommender, BaselineItemRecommender, BaselineUserRecommender,
    CatalogLookup, ClusterRecommender, InMemoryCatalog, NeighborhoodUserRecommender,
    PopularItemsProvider,
};
pub use composer::{Collaborators, RecommendationComposer};
pub use types::{
    CandidateSource, PriceRange, RecommendationCandidate, RecommendationRequest, ScoredItem,
};
