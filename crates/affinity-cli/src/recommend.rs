//! Recommend command implementation.
//!
//! Loads the persisted clusters, folds the dataset's users into them, and
//! composes recommendations for one user.

use crate::config;
use crate::dataset::Dataset;
use affinity_core::cluster::{ArtClusterManager, Assignment, ClusterStore, RedbClusterStore};
use affinity_core::config::EngineConfig;
use affinity_core::error::{ClusterError, VectorError};
use affinity_core::ratings::{ItemId, UserId};
use affinity_core::recommend::{
    AdjustedCosineItemRecommender, Collaborators, NeighborhoodUserRecommender, PriceRange,
    RecommendationCandidate, RecommendationComposer, RecommendationRequest,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// What to recommend, and for whom.
#[derive(Debug, Clone)]
pub struct RecommendOptions {
    pub user_id: UserId,
    pub count: usize,
    pub anchor_item: Option<ItemId>,
    pub price_range: Option<PriceRange>,
    /// Drop persisted clusters before assigning
    pub reset: bool,
}

impl RecommendOptions {
    fn request(&self) -> RecommendationRequest {
        let mut request = RecommendationRequest::new(self.user_id, self.count);
        if let Some(anchor) = self.anchor_item {
            request = request.with_anchor(anchor);
        }
        if let Some(range) = self.price_range {
            request = request.with_price_range(range);
        }
        request
    }
}

/// Counts from the assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub created: usize,
    pub joined: usize,
    pub refreshed: usize,
    /// Users skipped because they have no ratings
    pub skipped: usize,
    /// Clusters in the store after the pass
    pub clusters: usize,
}

#[derive(Debug, Clone)]
pub struct RecommendOutcome {
    pub summary: AssignmentSummary,
    pub candidates: Vec<RecommendationCandidate>,
}

/// Runs the full pipeline against the cluster database in `data_dir`.
///
/// This function:
/// 1. Opens (or creates) the cluster database, clearing it on `reset`
/// 2. Assigns every dataset user in ascending id order
/// 3. Wires the reference collaborators around the dataset
/// 4. Composes recommendations for the requested user
pub async fn execute_recommend(
    dataset: &Dataset,
    engine_config: &EngineConfig,
    options: &RecommendOptions,
    data_dir: Option<&PathBuf>,
) -> Result<RecommendOutcome> {
    // 1. Open store
    let db_path = config::database_path(data_dir)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    info!("Opening cluster database: {}", db_path.display());
    let store = RedbClusterStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    if options.reset {
        info!("Clearing persisted clusters");
        store.clear().await.context("Failed to clear clusters")?;
    }

    // 2. Assign users
    let ratings = Arc::new(dataset.rating_store());
    let manager = Arc::new(
        ArtClusterManager::new(store, ratings.clone(), engine_config.clustering)
            .context("Invalid clustering configuration")?,
    );

    let users = ratings.user_ids().context("Failed to list users")?;
    info!("Assigning {} users", users.len());

    let mut summary = AssignmentSummary::default();
    for user in users {
        match manager.assign_user(user).await {
            Ok(Assignment::Created(_)) => summary.created += 1,
            Ok(Assignment::Joined { .. }) => summary.joined += 1,
            Ok(Assignment::Refreshed(_)) => summary.refreshed += 1,
            Err(ClusterError::Vector(VectorError::NoRatingData(_))) => {
                debug!("Skipping user {} without ratings", user);
                summary.skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to assign user {}", user));
            }
        }
    }
    summary.clusters = manager
        .store()
        .cluster_count()
        .await
        .context("Failed to count clusters")?;
    info!(
        "Assignment done: {} created, {} joined, {} refreshed, {} clusters",
        summary.created, summary.joined, summary.refreshed, summary.clusters
    );

    // 3. Collaborators
    let collaborators = Collaborators {
        ratings: ratings.clone(),
        user_based: Arc::new(NeighborhoodUserRecommender::new(
            ratings.clone(),
            engine_config.neighborhood_size,
        )),
        item_based: Arc::new(AdjustedCosineItemRecommender::new(ratings.clone())),
        clusters: manager,
        catalog: Arc::new(dataset.catalog()),
        popular: ratings,
    };
    let composer = RecommendationComposer::new(collaborators, engine_config.composer)
        .context("Invalid composer configuration")?;

    // 4. Compose
    let candidates = composer.recommend(&options.request()).await;
    info!(
        "Composed {} recommendations for user {}",
        candidates.len(),
        options.user_id
    );

    Ok(RecommendOutcome {
        summary,
        candidates,
    })
}
