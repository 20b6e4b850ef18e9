use crate::ratings::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An item with a source-specific score.
///
/// Scores are only comparable within one source: baseline recommenders
/// predict ratings, the item-based source yields similarities in [-1, 1] and
/// the cluster source yields co-member fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_id: ItemId, score: f64) -> Self {
        Self { item_id, score }
    }
}

/// A ranked recommendation ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    /// Catalog item
    pub item_id: ItemId,
    /// Human-readable name (falls back to `item-<id>` when the catalog has none)
    pub display_name: String,
    /// Display score in the configured range; 0.0 for popular-item fallbacks
    pub score: f64,
}

/// Inclusive price window used to post-filter candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Creates a window; bounds given in reverse order are swapped.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

/// A hybrid recommendation request.
///
/// # Examples
///
/// ```ignore
/// let request = RecommendationRequest::new(UserId::from_u64(7), 10)
///     .with_anchor(ItemId::from_u64(42))
///     .with_price_range(PriceRange::new(10.0, 50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    pub count: usize,
    /// Item the user is looking at; enables the item-based source
    pub anchor_item: Option<ItemId>,
    pub price_range: Option<PriceRange>,
}

impl RecommendationRequest {
    pub fn new(user_id: UserId, count: usize) -> Self {
        Self {
            user_id,
            count,
            anchor_item: None,
            price_range: None,
        }
    }

    pub fn with_anchor(mut self, item_id: ItemId) -> Self {
        self.anchor_item = Some(item_id);
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
        self
    }
}

/// The recommendation sources fused by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    UserBased,
    ItemBased,
    ClusterBased,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::UserBased => "user-based",
            CandidateSource::ItemBased => "item-based",
            CandidateSource::ClusterBased => "cluster-based",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
