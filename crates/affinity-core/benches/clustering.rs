//! Benchmarks for ART cluster assignment and cluster-based recommendation.
//!
//! Run with: `cargo bench -p affinity-core --bench clustering`
//!
//! Assignment scans every cluster prototype under a single lock, so cost
//! grows with the number of clusters and the vector dimensionality.

use affinity_core::cluster::{ArtClusterManager, InMemoryClusterStore, Vigilance};
use affinity_core::config::ClusteringConfig;
use affinity_core::ratings::{InMemoryRatingStore, ItemId, RatingSample, UserId, UserVector};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

fn seeded_unit(a: u64, b: u64) -> f64 {
    let mut hasher = DefaultHasher::new();
    a.hash(&mut hasher);
    b.hash(&mut hasher);
    hasher.finish() as f64 / u64::MAX as f64
}

fn seeded_vector(seed: u64, dim: usize) -> Vec<f64> {
    (0..dim)
        .map(|i| {
            let roll = seeded_unit(seed, i as u64);
            if roll < 0.2 {
                1.0 + (roll * 20.0).floor()
            } else {
                0.0
            }
        })
        .collect()
}

fn manager(ratings: InMemoryRatingStore) -> ArtClusterManager<InMemoryClusterStore> {
    ArtClusterManager::new(
        InMemoryClusterStore::new(),
        Arc::new(ratings),
        ClusteringConfig::default(),
    )
    .unwrap()
}

/// Benchmark: assign one new user into a store that already holds
/// `users` assignments.
fn bench_assign_by_population(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("art/assign_by_population");
    group.sample_size(30);

    let dim = 200;
    let vigilance = Vigilance::new(0.9).unwrap();

    for users in [10u64, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(users), &users, |b, &users| {
            b.iter_batched(
                || {
                    let manager = manager(InMemoryRatingStore::new());
                    rt.block_on(async {
                        for user in 0..users {
                            let vector =
                                UserVector::new(UserId::from_u64(user), seeded_vector(user, dim));
                            manager.assign(&vector, vigilance).await.unwrap();
                        }
                    });
                    manager
                },
                |manager| {
                    let vector =
                        UserVector::new(UserId::from_u64(users), seeded_vector(users, dim));
                    rt.block_on(manager.assign(black_box(&vector), vigilance))
                        .unwrap()
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

/// Benchmark: cluster-based recommendation with every user in one cluster.
fn bench_recommend_from_cluster(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("art/recommend_from_cluster");
    group.sample_size(30);

    let items = 100u64;
    for users in [20u64, 100, 400] {
        let ratings = InMemoryRatingStore::new();
        for user in 0..users {
            for item in 0..items {
                let roll = seeded_unit(user, item + 10_000);
                if roll < 0.2 {
                    ratings
                        .record(RatingSample {
                            user_id: UserId::from_u64(user),
                            item_id: ItemId::from_u64(item),
                            rating: 1.0 + (roll * 20.0).floor(),
                            timestamp: 0,
                        })
                        .unwrap();
                }
            }
        }

        let config = ClusteringConfig {
            vigilance: 0.0,
            ..ClusteringConfig::default()
        };
        let manager = ArtClusterManager::new(InMemoryClusterStore::new(), Arc::new(ratings), config)
            .unwrap();
        rt.block_on(async {
            for user in 0..users {
                // Users whose rolls produced no samples are skipped
                let _ = manager.assign_user(UserId::from_u64(user)).await;
            }
        });

        group.bench_with_input(BenchmarkId::from_parameter(users), &users, |b, _| {
            b.iter(|| {
                rt.block_on(manager.recommend_from_cluster(black_box(UserId::from_u64(0)), 10))
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_assign_by_population, bench_recommend_from_cluster);
criterion_main!(benches);
