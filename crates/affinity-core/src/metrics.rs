//! Engine metrics collection with rolling averages.
//!
//! Lightweight in-memory collector for assignment and recommendation timings,
//! plus counters for cluster lifecycle events and recovered source failures.
//!
//! ## Architecture
//!
//! A global singleton (`global_metrics()`) is shared by the ART manager and
//! the composer. Tests that assert on counts create their own
//! [`EngineMetrics`] instead, since the global collector sees every test.
//!
//! ## Metrics Categories
//!
//! - **Clustering**: assignment latency, clusters created, adapted, refreshed
//! - **Recommendation**: compose latency, per-source timeouts and failures,
//!   popular-item fallbacks

use instant::Instant;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::recommend::CandidateSource;

/// Rolling window for assignment latency. Assignments arrive in ingest bursts.
const ASSIGNMENT_WINDOW: Duration = Duration::from_secs(60);

/// Rolling window for compose latency.
const COMPOSE_WINDOW: Duration = Duration::from_secs(300);

/// Samples kept per latency series; the oldest are dropped first.
const MAX_SAMPLES: usize = 1000;

/// Bounded series of `(recorded_at, duration_ms)` samples plus a lifetime
/// counter.
#[derive(Debug)]
struct LatencySeries {
    window: Duration,
    samples: VecDeque<(Instant, f64)>,
    lifetime: u64,
}

impl LatencySeries {
    fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            lifetime: 0,
        }
    }

    fn push(&mut self, duration_ms: f64) {
        self.lifetime += 1;
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((Instant::now(), duration_ms));
    }

    fn cutoff(&self) -> Option<Instant> {
        Instant::now().checked_sub(self.window)
    }

    /// Drop samples recorded before the window.
    fn evict_stale(&mut self) {
        if let Some(cutoff) = self.cutoff() {
            while self.samples.front().is_some_and(|(at, _)| *at < cutoff) {
                self.samples.pop_front();
            }
        }
    }

    /// `(count, average)` of the samples inside the window.
    fn windowed(&self) -> (usize, Option<f64>) {
        let cutoff = self.cutoff();
        let (count, total) = self
            .samples
            .iter()
            .filter(|(at, _)| cutoff.map_or(true, |c| *at >= c))
            .fold((0usize, 0.0), |(n, sum), (_, ms)| (n + 1, sum + ms));

        (count, (count > 0).then(|| total / count as f64))
    }
}

/// Per-source failure counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceFailures {
    pub user_based: u64,
    pub item_based: u64,
    pub cluster_based: u64,
}

impl SourceFailures {
    fn bump(&mut self, source: CandidateSource) {
        match source {
            CandidateSource::UserBased => self.user_based += 1,
            CandidateSource::ItemBased => self.item_based += 1,
            CandidateSource::ClusterBased => self.cluster_based += 1,
        }
    }
}

/// Collected metrics snapshot.
#[derive(Clone, Debug, Default)]
pub struct MetricsSnapshot {
    /// Average assignment latency over the window (ms).
    pub assignment_avg_ms: Option<f64>,
    pub assignment_count: usize,

    /// Lifetime cluster lifecycle counters.
    pub clusters_created: u64,
    pub clusters_adapted: u64,
    pub members_refreshed: u64,

    /// Average hybrid recommendation latency over the window (ms).
    pub compose_avg_ms: Option<f64>,
    pub compose_count: usize,

    /// Lifetime count of requests served from popular items.
    pub popular_fallbacks: u64,

    /// Lifetime source timeouts, by source.
    pub source_timeouts: SourceFailures,
    /// Lifetime source errors, by source.
    pub source_errors: SourceFailures,
}

struct MetricsInner {
    assignment: LatencySeries,
    compose: LatencySeries,
    clusters_created: u64,
    clusters_adapted: u64,
    members_refreshed: u64,
    popular_fallbacks: u64,
    source_timeouts: SourceFailures,
    source_errors: SourceFailures,
}

impl MetricsInner {
    fn new(assignment_window: Duration, compose_window: Duration) -> Self {
        Self {
            assignment: LatencySeries::new(assignment_window),
            compose: LatencySeries::new(compose_window),
            clusters_created: 0,
            clusters_adapted: 0,
            members_refreshed: 0,
            popular_fallbacks: 0,
            source_timeouts: SourceFailures::default(),
            source_errors: SourceFailures::default(),
        }
    }
}

/// Engine metrics collector.
///
/// Thread-safe collector for timing metrics with rolling averages. Use
/// `record_*` methods to log events and `snapshot()` to read statistics.
///
/// Assignment timings use a 60 second window; recommendation timings use a
/// 5 minute window since requests are less frequent than ingest bursts.
#[derive(Clone)]
pub struct EngineMetrics {
    inner: Arc<RwLock<MetricsInner>>,
}

impl EngineMetrics {
    /// Create a new metrics collector with default windows.
    pub fn new() -> Self {
        Self::with_windows(ASSIGNMENT_WINDOW, COMPOSE_WINDOW)
    }

    /// Create a collector where both categories share one window.
    pub fn with_window(window_secs: u64) -> Self {
        let window = Duration::from_secs(window_secs);
        Self::with_windows(window, window)
    }

    fn with_windows(assignment: Duration, compose: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner::new(assignment, compose))),
        }
    }

    // =========================================================================
    // Clustering metrics
    // =========================================================================

    /// Record the latency of one cluster assignment.
    pub fn record_assignment(&self, duration_ms: f64) {
        if let Ok(mut inner) = self.inner.write() {
            inner.assignment.push(duration_ms);
        }
    }

    pub fn record_cluster_created(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.clusters_created += 1;
        }
    }

    pub fn record_cluster_adapted(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.clusters_adapted += 1;
        }
    }

    pub fn record_member_refreshed(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.members_refreshed += 1;
        }
    }

    // =========================================================================
    // Recommendation metrics
    // =========================================================================

    /// Record the latency of one composed recommendation.
    pub fn record_compose(&self, duration_ms: f64) {
        if let Ok(mut inner) = self.inner.write() {
            inner.compose.push(duration_ms);
        }
    }

    pub fn record_popular_fallback(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.popular_fallbacks += 1;
        }
    }

    pub fn record_source_timeout(&self, source: CandidateSource) {
        if let Ok(mut inner) = self.inner.write() {
            inner.source_timeouts.bump(source);
        }
    }

    pub fn record_source_error(&self, source: CandidateSource) {
        if let Ok(mut inner) = self.inner.write() {
            inner.source_errors.bump(source);
        }
    }

    // =========================================================================
    // Snapshot and maintenance
    // =========================================================================

    /// Prune old samples outside the windows.
    pub fn prune(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.assignment.evict_stale();
            inner.compose.evict_stale();
        }
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = match self.inner.read() {
            Ok(inner) => inner,
            Err(_) => return MetricsSnapshot::default(),
        };

        let (assignment_count, assignment_avg_ms) = inner.assignment.windowed();
        let (compose_count, compose_avg_ms) = inner.compose.windowed();

        MetricsSnapshot {
            assignment_avg_ms,
            assignment_count,
            clusters_created: inner.clusters_created,
            clusters_adapted: inner.clusters_adapted,
            members_refreshed: inner.members_refreshed,
            compose_avg_ms,
            compose_count,
            popular_fallbacks: inner.popular_fallbacks,
            source_timeouts: inner.source_timeouts,
            source_errors: inner.source_errors,
        }
    }

    /// Lifetime number of recorded assignments (not windowed).
    pub fn total_assignments(&self) -> u64 {
        self.inner
            .read()
            .map(|inner| inner.assignment.lifetime)
            .unwrap_or(0)
    }

    /// Reset every series and counter, keeping the configured windows.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            let assignment = inner.assignment.window;
            let compose = inner.compose.window;
            *inner = MetricsInner::new(assignment, compose);
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_METRICS: Lazy<EngineMetrics> = Lazy::new(EngineMetrics::new);

/// Get the global metrics collector.
pub fn global_metrics() -> &'static EngineMetrics {
    &GLOBAL_METRICS
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
