//! Adaptive resonance (ART) cluster assignment.
//!
//! Each incoming user vector is compared against cluster prototypes in
//! creation order. The first prototype whose cosine similarity reaches the
//! vigilance threshold takes the user and moves toward the vector; when no
//! prototype resonates a new cluster is created around the vector.
//!
//! The scan and the mutation that follows it form one critical section
//! guarded by a `tokio::sync::Mutex`. Two concurrent assignments can
//! therefore never both create a cluster for the same input, and adaptation
//! never loses an update.
//!
//! Results depend on input order: the same vectors presented in a different
//! order may produce a different partition. Presenting the same ordered
//! sequence always produces the same clusters.
//!
//! Vector slots follow the store's item axis. Items rated for the first time
//! are appended to the axis, so stored prototypes and member vectors only
//! ever need zero-padding at the end.

use super::store::ClusterStore;
use super::types::{Assignment, Cluster, Vigilance};
use crate::config::ClusteringConfig;
use crate::error::ClusterError;
use crate::metrics::{elapsed_ms, global_metrics, EngineMetrics};
use crate::ratings::{ItemId, ItemUniverse, RatingStore, UserId, UserVector, UserVectorBuilder};
use crate::recommend::fusion::sort_by_score;
use crate::recommend::{ClusterRecommender, ScoredItem};
use crate::similarity::cosine_similarity;
use async_trait::async_trait;
use instant::Instant;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Assigns users to clusters and recommends from cluster co-members.
pub struct ArtClusterManager<S: ClusterStore> {
    store: S,
    ratings: Arc<dyn RatingStore>,
    vectors: UserVectorBuilder,
    config: ClusteringConfig,
    vigilance: Vigilance,
    assign_lock: Mutex<()>,
    metrics: EngineMetrics,
}

impl<S: ClusterStore> ArtClusterManager<S> {
    /// Creates a manager over `store`, reading ratings from `ratings`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if the clustering config is
    /// out of range.
    pub fn new(
        store: S,
        ratings: Arc<dyn RatingStore>,
        config: ClusteringConfig,
    ) -> Result<Self, ClusterError> {
        config.validate()?;
        let vigilance = Vigilance::new(config.vigilance)?;
        Ok(Self {
            store,
            vectors: UserVectorBuilder::new(Arc::clone(&ratings)),
            ratings,
            config,
            vigilance,
            assign_lock: Mutex::new(()),
            metrics: global_metrics().clone(),
        })
    }

    /// Records into `metrics` instead of the global collector.
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Builds the user's vector from the rating store and assigns it with the
    /// configured vigilance.
    ///
    /// # Errors
    ///
    /// `ClusterError::Vector(VectorError::NoRatingData)` when the user has no
    /// ratings; store errors fail this assignment only.
    #[instrument(skip(self))]
    pub async fn assign_user(&self, user_id: UserId) -> Result<Assignment, ClusterError> {
        let start = Instant::now();
        let _guard = self.assign_lock.lock().await;

        let universe = self.sync_item_axis().await?;
        let vector = self.vectors.build_with_universe(user_id, &universe).await?;

        let result = self.assign_locked(&vector, self.vigilance).await;
        self.metrics.record_assignment(elapsed_ms(start));
        result
    }

    /// The item axis stored vectors are laid out over.
    ///
    /// Callers of [`assign`](Self::assign) build their vectors against it.
    pub async fn item_axis(&self) -> Result<ItemUniverse, ClusterError> {
        Ok(ItemUniverse::from_axis(self.store.item_axis().await?))
    }

    /// Appends newly rated items to the stored axis.
    async fn sync_item_axis(&self) -> Result<ItemUniverse, ClusterError> {
        let rated = self.vectors.universe().await?;
        let axis = self.store.extend_item_axis(rated.items()).await?;
        Ok(ItemUniverse::from_axis(axis))
    }

    /// Assigns a user vector to the first resonating cluster, or creates one.
    ///
    /// `vector` must be laid out over [`item_axis`](Self::item_axis); extra
    /// trailing slots are treated as items not yet on the axis.
    ///
    /// A user that already belongs to a cluster keeps its membership: the
    /// stored member vector is replaced and no resonance scan happens.
    #[instrument(skip_all, fields(user_id = %vector.user_id(), dim = vector.dim()))]
    pub async fn assign(
        &self,
        vector: &UserVector,
        vigilance: Vigilance,
    ) -> Result<Assignment, ClusterError> {
        let start = Instant::now();
        let _guard = self.assign_lock.lock().await;

        let result = self.assign_locked(vector, vigilance).await;
        self.metrics.record_assignment(elapsed_ms(start));
        result
    }

    async fn assign_locked(
        &self,
        vector: &UserVector,
        vigilance: Vigilance,
    ) -> Result<Assignment, ClusterError> {
        let user_id = vector.user_id();
        let input = vector.values();
        let clusters = self.store.find_all().await?;

        if let Some(widest) = clusters.iter().map(Cluster::dim).max() {
            if input.len() < widest {
                return Err(ClusterError::DimensionMismatch {
                    expected: widest,
                    actual: input.len(),
                });
            }
        }

        if let Some(existing) = clusters.iter().find(|c| c.contains(user_id)) {
            let mut cluster = existing.clone();
            cluster.grow_to(input.len());
            cluster.insert_member(user_id, input.to_vec());
            self.store.save(&cluster).await?;

            debug!("Refreshed vector of user {} in cluster {}", user_id, cluster.id());
            self.metrics.record_member_refreshed();
            return Ok(Assignment::Refreshed(cluster.id()));
        }

        for mut cluster in clusters {
            cluster.grow_to(input.len());
            let similarity = cosine_similarity(cluster.weights(), input);
            debug!(
                "User {} vs cluster {}: similarity {:.4} (vigilance {})",
                user_id,
                cluster.id(),
                similarity,
                vigilance.value()
            );

            if vigilance.resonates(similarity) {
                cluster.insert_member(user_id, input.to_vec());
                cluster.adapt_toward(input, self.config.learning_rate);
                self.store.save(&cluster).await?;

                info!(
                    "User {} joined cluster {} (similarity {:.4}, {} members)",
                    user_id,
                    cluster.id(),
                    similarity,
                    cluster.len()
                );
                self.metrics.record_cluster_adapted();
                return Ok(Assignment::Joined {
                    cluster_id: cluster.id(),
                    similarity,
                });
            }
        }

        if let Some(mut twin) = self.store.find_by_weights(input).await? {
            // Zero-norm inputs and rounding at vigilance 1.0 miss an equal prototype
            twin.insert_member(user_id, input.to_vec());
            self.store.save(&twin).await?;

            debug!("User {} matched prototype of cluster {}", user_id, twin.id());
            return Ok(Assignment::Joined {
                cluster_id: twin.id(),
                similarity: cosine_similarity(twin.weights(), input),
            });
        }

        let cluster = self
            .store
            .create(input.to_vec(), user_id, input.to_vec())
            .await?;
        info!("Created cluster {} for user {}", cluster.id(), user_id);
        self.metrics.record_cluster_created();
        Ok(Assignment::Created(cluster.id()))
    }

    /// The cluster containing `user_id`, if any.
    pub async fn cluster_of(&self, user_id: UserId) -> Result<Option<Cluster>, ClusterError> {
        let clusters = self.store.find_all().await?;
        Ok(clusters.into_iter().find(|c| c.contains(user_id)))
    }

    /// Recommends items that the user's cluster co-members like.
    ///
    /// An item is "liked" by a co-member when they rated it at or above their
    /// own mean rating. The score is the fraction of co-members that like the
    /// item. Items the user already rated are excluded. Users outside every
    /// cluster get an empty list.
    #[instrument(skip(self))]
    pub async fn recommend_from_cluster(
        &self,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<ScoredItem>, ClusterError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let Some(cluster) = self.cluster_of(user_id).await? else {
            debug!("User {} is not in any cluster", user_id);
            return Ok(Vec::new());
        };

        let co_members = cluster.len().saturating_sub(1);
        if co_members == 0 {
            return Ok(Vec::new());
        }

        let universe = self.item_axis().await?;
        let rated = self.rated_items(user_id, &cluster, &universe).await;

        let mut likes: BTreeMap<usize, usize> = BTreeMap::new();
        for (member, values) in cluster.members() {
            if *member == user_id {
                continue;
            }
            for slot in liked_slots(values) {
                *likes.entry(slot).or_insert(0) += 1;
            }
        }

        let mut scored: Vec<ScoredItem> = likes
            .into_iter()
            .filter_map(|(slot, count)| {
                let item_id = universe.item_at(slot)?;
                if rated.contains(&item_id) {
                    return None;
                }
                Some(ScoredItem::new(item_id, count as f64 / co_members as f64))
            })
            .collect();

        sort_by_score(&mut scored);
        scored.truncate(n);

        debug!(
            "Cluster {} produced {} candidates for user {}",
            cluster.id(),
            scored.len(),
            user_id
        );
        Ok(scored)
    }

    /// Items the user has rated: fresh from the rating store, or the stored
    /// member vector when the store is unavailable.
    async fn rated_items(
        &self,
        user_id: UserId,
        cluster: &Cluster,
        universe: &ItemUniverse,
    ) -> HashSet<ItemId> {
        match self.ratings.samples_for_user(user_id).await {
            Ok(samples) => samples.into_iter().map(|s| s.item_id).collect(),
            Err(e) => {
                warn!(
                    "Rating store failed for user {} ({}), using stored member vector",
                    user_id, e
                );
                cluster
                    .member_vector(user_id)
                    .unwrap_or_default()
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| **value != 0.0)
                    .filter_map(|(slot, _)| universe.item_at(slot))
                    .collect()
            }
        }
    }
}

/// Slots a member rated at or above their own mean over rated slots.
fn liked_slots(values: &[f64]) -> Vec<usize> {
    let rated: Vec<(usize, f64)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, value)| *value != 0.0)
        .collect();
    if rated.is_empty() {
        return Vec::new();
    }

    let mean = rated.iter().map(|(_, value)| value).sum::<f64>() / rated.len() as f64;
    rated
        .into_iter()
        .filter(|(_, value)| *value >= mean)
        .map(|(slot, _)| slot)
        .collect()
}

#[async_trait]
impl<S: ClusterStore> ClusterRecommender for ArtClusterManager<S> {
    async fn recommend_from_cluster(
        &self,
        user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, ClusterError> {
        Self::recommend_from_cluster(self, user_id, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::InMemoryClusterStore;
    use crate::error::VectorError;
    use crate::ratings::InMemoryRatingStore;
    use crate::test_utils::rating;
    use std::collections::BTreeSet;

    fn manager() -> ArtClusterManager<InMemoryClusterStore> {
        manager_with(InMemoryRatingStore::new(), ClusteringConfig::default())
    }

    fn manager_with(
        ratings: InMemoryRatingStore,
        config: ClusteringConfig,
    ) -> ArtClusterManager<InMemoryClusterStore> {
        ArtClusterManager::new(InMemoryClusterStore::new(), Arc::new(ratings), config)
            .unwrap()
            .with_metrics(EngineMetrics::new())
    }

    fn vector(user: u64, values: &[f64]) -> UserVector {
        UserVector::new(UserId::from_u64(user), values.to_vec())
    }

    fn rho(value: f64) -> Vigilance {
        Vigilance::new(value).unwrap()
    }

    /// Partition as a set of member-id sets.
    async fn partition(manager: &ArtClusterManager<InMemoryClusterStore>) -> BTreeSet<Vec<u64>> {
        manager
            .store()
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|c| c.members().keys().map(|u| u.as_u64()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_similar_users_share_adapted_cluster() {
        let manager = manager();

        let first = manager.assign(&vector(1, &[5.0, 3.0]), rho(0.9)).await.unwrap();
        let second = manager.assign(&vector(2, &[5.0, 3.2]), rho(0.9)).await.unwrap();

        assert!(matches!(first, Assignment::Created(_)));
        assert!(matches!(second, Assignment::Joined { similarity, .. } if similarity > 0.99));

        let clusters = manager.store().find_all().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
        assert!((clusters[0].weights()[0] - 5.0).abs() < 1e-9);
        assert!((clusters[0].weights()[1] - 3.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_dissimilar_user_creates_new_cluster() {
        let manager = manager();
        manager.assign(&vector(1, &[5.0, 0.0]), rho(0.9)).await.unwrap();
        let result = manager.assign(&vector(2, &[0.0, 5.0]), rho(0.9)).await.unwrap();

        assert!(matches!(result, Assignment::Created(id) if id.as_u64() == 1));
        assert_eq!(manager.store().cluster_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_first_resonating_cluster_wins_over_best() {
        let manager = manager();
        manager.assign(&vector(1, &[0.0, 0.0, 1.0]), rho(0.9)).await.unwrap();
        manager.assign(&vector(2, &[1.0, 0.0, 0.0]), rho(0.9)).await.unwrap();
        manager.assign(&vector(3, &[1.0, 0.7, 0.0]), rho(0.9)).await.unwrap();
        assert_eq!(manager.store().cluster_count().await.unwrap(), 3);

        // ~0.912 against cluster 1, ~0.982 against cluster 2
        let input = [1.0, 0.45, 0.0];
        let result = manager.assign(&vector(4, &input), rho(0.9)).await.unwrap();

        assert_eq!(result.cluster_id().as_u64(), 1);
        let clusters = manager.store().find_all().await.unwrap();
        assert_eq!(clusters[2].weights(), &[1.0, 0.7, 0.0]);
        assert_eq!(clusters[2].len(), 1);
    }

    #[tokio::test]
    async fn test_adaptation_moves_prototype_toward_member() {
        let manager = manager();
        manager.assign(&vector(1, &[1.0, 0.0, 0.0]), rho(0.9)).await.unwrap();

        let input = [1.0, 0.45, 0.0];
        let before = [1.0, 0.0, 0.0];
        manager.assign(&vector(2, &input), rho(0.9)).await.unwrap();

        let after = manager.store().find_all().await.unwrap()[0].weights().to_vec();
        let distance = |w: &[f64]| -> f64 {
            w.iter()
                .zip(&input)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        };

        assert!(distance(&after) < distance(&before));
        assert!((after[1] - 0.225).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_same_ordered_input_is_deterministic() {
        let inputs = [
            vector(1, &[5.0, 1.0, 0.0]),
            vector(2, &[4.0, 0.0, 1.0]),
            vector(3, &[0.0, 5.0, 4.0]),
            vector(4, &[0.0, 4.0, 5.0]),
            vector(5, &[5.0, 0.0, 0.0]),
        ];

        let mut runs = Vec::new();
        for _ in 0..2 {
            let manager = manager();
            for input in &inputs {
                manager.assign(input, rho(0.9)).await.unwrap();
            }
            runs.push(manager.store().find_all().await.unwrap());
        }

        assert_eq!(runs[0], runs[1]);
    }

    #[tokio::test]
    async fn test_input_order_changes_partition() {
        let a = vector(1, &[1.0, 0.0]);
        let b = vector(2, &[1.0, 0.45]);
        let c = vector(3, &[1.0, 0.9]);

        let forward = manager();
        for input in [&a, &b, &c] {
            forward.assign(input, rho(0.9)).await.unwrap();
        }

        let reverse = manager();
        for input in [&c, &b, &a] {
            reverse.assign(input, rho(0.9)).await.unwrap();
        }

        let expected_forward: BTreeSet<Vec<u64>> = [vec![1, 2], vec![3]].into_iter().collect();
        let expected_reverse: BTreeSet<Vec<u64>> = [vec![2, 3], vec![1]].into_iter().collect();
        assert_eq!(partition(&forward).await, expected_forward);
        assert_eq!(partition(&reverse).await, expected_reverse);
    }

    #[tokio::test]
    async fn test_existing_member_is_refreshed_not_rescanned() {
        let manager = manager();
        manager.assign(&vector(1, &[5.0, 3.0]), rho(0.9)).await.unwrap();

        let result = manager.assign(&vector(1, &[0.0, 5.0]), rho(0.9)).await.unwrap();
        assert_eq!(result, Assignment::Refreshed(result.cluster_id()));

        let clusters = manager.store().find_all().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].weights(), &[5.0, 3.0]);
        assert_eq!(
            clusters[0].member_vector(UserId::from_u64(1)),
            Some(&[0.0, 5.0][..])
        );
    }

    #[tokio::test]
    async fn test_longer_vector_pads_cluster() {
        let manager = manager();
        manager.assign(&vector(1, &[5.0, 3.0]), rho(0.9)).await.unwrap();

        let result = manager
            .assign(&vector(2, &[5.0, 3.0, 0.5]), rho(0.9))
            .await
            .unwrap();
        assert!(matches!(result, Assignment::Joined { .. }));

        let cluster = &manager.store().find_all().await.unwrap()[0];
        assert_eq!(cluster.dim(), 3);
        assert_eq!(
            cluster.member_vector(UserId::from_u64(1)),
            Some(&[5.0, 3.0, 0.0][..])
        );
        assert!((cluster.weights()[2] - 0.25).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_shorter_vector_is_rejected() {
        let manager = manager();
        manager
            .assign(&vector(1, &[5.0, 3.0, 1.0]), rho(0.9))
            .await
            .unwrap();

        let err = manager
            .assign(&vector(2, &[5.0, 3.0]), rho(0.9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClusterError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(manager.store().find_all().await.unwrap()[0].len(), 1);
    }

    #[tokio::test]
    async fn test_assign_user_without_ratings_fails() {
        let manager = manager();
        let err = manager.assign_user(UserId::from_u64(9)).await.unwrap_err();
        assert!(matches!(
            err,
            ClusterError::Vector(VectorError::NoRatingData(user)) if user.as_u64() == 9
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClusteringConfig {
            vigilance: 1.5,
            ..ClusteringConfig::default()
        };
        let result = ArtClusterManager::new(
            InMemoryClusterStore::new(),
            Arc::new(InMemoryRatingStore::new()),
            config,
        );
        assert!(matches!(result, Err(ClusterError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_concurrent_assignments_lose_no_members() {
        let ratings = InMemoryRatingStore::new();
        for user in 1..=16 {
            ratings.record(rating(user, 10, 5.0)).unwrap();
            ratings.record(rating(user, 11, 4.0)).unwrap();
        }
        let manager = Arc::new(manager_with(ratings, ClusteringConfig::default()));

        let mut handles = Vec::new();
        for user in 1..=16 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.assign_user(UserId::from_u64(user)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let clusters = manager.store().find_all().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 16);
    }

    fn cluster_fixture() -> InMemoryRatingStore {
        InMemoryRatingStore::with_samples(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 4.0),
            // mean 3.67: likes 10, 12
            rating(2, 10, 5.0),
            rating(2, 12, 5.0),
            rating(2, 13, 1.0),
            // mean 3.33: likes 11, 12
            rating(3, 11, 4.0),
            rating(3, 12, 4.0),
            rating(3, 14, 2.0),
            // mean 3.0: likes 14
            rating(4, 10, 1.0),
            rating(4, 14, 5.0),
        ])
    }

    async fn clustered_manager() -> ArtClusterManager<InMemoryClusterStore> {
        // Vigilance 0 puts every non-negative vector in one cluster
        let config = ClusteringConfig {
            vigilance: 0.0,
            ..ClusteringConfig::default()
        };
        let manager = manager_with(cluster_fixture(), config);
        for user in 1..=4 {
            manager.assign_user(UserId::from_u64(user)).await.unwrap();
        }
        manager
    }

    #[tokio::test]
    async fn test_recommend_from_cluster_scores_by_co_member_fraction() {
        let manager = clustered_manager().await;

        let items = manager
            .recommend_from_cluster(UserId::from_u64(1), 10)
            .await
            .unwrap();

        let ids: Vec<u64> = items.iter().map(|s| s.item_id.as_u64()).collect();
        assert_eq!(ids, vec![12, 14]);
        assert!((items[0].score - 2.0 / 3.0).abs() < 1e-12);
        assert!((items[1].score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_recommend_from_cluster_truncates() {
        let manager = clustered_manager().await;
        let items = manager
            .recommend_from_cluster(UserId::from_u64(1), 1)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id.as_u64(), 12);
    }

    #[tokio::test]
    async fn test_recommend_for_unclustered_user_is_empty() {
        let manager = clustered_manager().await;
        let items = manager
            .recommend_from_cluster(UserId::from_u64(99), 5)
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_exact_prototype_is_joined_not_recreated() {
        let manager = manager();
        manager.assign(&vector(1, &[0.0, 0.0]), rho(0.5)).await.unwrap();

        let result = manager.assign(&vector(2, &[0.0, 0.0]), rho(0.5)).await.unwrap();
        assert!(matches!(
            result,
            Assignment::Joined { cluster_id, similarity } if cluster_id.as_u64() == 0 && similarity == 0.0
        ));

        let clusters = manager.store().find_all().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[tokio::test]
    async fn test_item_first_rated_after_clustering_keeps_alignment() {
        let ratings = Arc::new(InMemoryRatingStore::with_samples(vec![
            rating(1, 10, 5.0),
            rating(1, 20, 1.0),
            rating(2, 10, 5.0),
            rating(2, 20, 1.0),
        ]));
        let config = ClusteringConfig {
            vigilance: 0.9,
            ..ClusteringConfig::default()
        };
        let manager = ArtClusterManager::new(InMemoryClusterStore::new(), ratings.clone(), config)
            .unwrap()
            .with_metrics(EngineMetrics::new());
        manager.assign_user(UserId::from_u64(1)).await.unwrap();
        manager.assign_user(UserId::from_u64(2)).await.unwrap();

        // Item 5 sorts before every clustered item
        ratings.record(rating(3, 5, 4.0)).unwrap();
        let items = manager
            .recommend_from_cluster(UserId::from_u64(1), 10)
            .await
            .unwrap();
        assert!(items.is_empty());

        ratings.record(rating(4, 10, 5.0)).unwrap();
        ratings.record(rating(4, 20, 1.0)).unwrap();
        let result = manager.assign_user(UserId::from_u64(4)).await.unwrap();
        assert!(matches!(
            result,
            Assignment::Joined { cluster_id, similarity }
                if cluster_id.as_u64() == 0 && similarity > 0.999
        ));

        let axis = manager.item_axis().await.unwrap();
        let ids: Vec<u64> = axis.items().iter().map(|i| i.as_u64()).collect();
        assert_eq!(ids, vec![10, 20, 5]);

        let cluster = manager
            .cluster_of(UserId::from_u64(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            cluster.member_vector(UserId::from_u64(4)),
            Some(&[5.0, 1.0, 0.0][..])
        );
        assert_eq!(
            cluster.member_vector(UserId::from_u64(2)),
            Some(&[5.0, 1.0, 0.0][..])
        );
    }

    #[test]
    fn test_liked_slots_uses_member_mean() {
        assert_eq!(liked_slots(&[5.0, 0.0, 1.0, 3.0]), vec![0, 3]);
        assert!(liked_slots(&[0.0, 0.0]).is_empty());
    }
}
