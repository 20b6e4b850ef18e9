use serde::{Deserialize, Serialize};
use std::fmt;

/// Current Unix time in seconds; 0 if the clock reads before the epoch.
///
/// Used as the timestamp of samples that arrive without one.
pub fn get_current_timestamp() -> u64 {
    instant::SystemTime::now()
        .duration_since(instant::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Storefront user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a UserId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog item identifier.
///
/// Ids carry no ordering guarantee: an item may receive its first rating long
/// after higher ids did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Creates an ItemId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single rating observation.
///
/// Produced by the storefront whenever a user rates or completes a purchase of
/// an item. Immutable once recorded; a user may have many samples per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSample {
    /// Who rated
    pub user_id: UserId,
    /// What was rated
    pub item_id: ItemId,
    /// Rating value (storefront scale, typically 1-5)
    pub rating: f64,
    /// Unix timestamp (seconds since UNIX_EPOCH)
    #[serde(default = "get_current_timestamp")]
    pub timestamp: u64,
}

impl RatingSample {
    /// Creates a sample stamped with the current time.
    pub fn new(user_id: UserId, item_id: ItemId, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp: get_current_timestamp(),
        }
    }
}

/// One user's rating of an item, as seen from the item's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preference {
    pub user_id: UserId,
    pub rating: f64,
}

/// All preferences for one item, sorted ascending by user id.
///
/// This is the input shape of adjusted cosine similarity, which merge-joins
/// two such lists by user id.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPreferences {
    pub item_id: ItemId,
    preferences: Vec<Preference>,
}

impl ItemPreferences {
    /// Builds the preference list of `item_id` from its rating samples.
    ///
    /// Samples of other items are ignored. When a user rated the item more
    /// than once, the latest sample wins.
    pub fn from_samples(item_id: ItemId, samples: &[RatingSample]) -> Self {
        let mut latest: std::collections::BTreeMap<UserId, (u64, f64)> =
            std::collections::BTreeMap::new();
        for sample in samples.iter().filter(|s| s.item_id == item_id) {
            let entry = latest
                .entry(sample.user_id)
                .or_insert((sample.timestamp, sample.rating));
            if sample.timestamp >= entry.0 {
                *entry = (sample.timestamp, sample.rating);
            }
        }

        Self {
            item_id,
            preferences: latest
                .into_iter()
                .map(|(user_id, (_, rating))| Preference { user_id, rating })
                .collect(),
        }
    }

    /// Preferences sorted ascending by user id.
    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }
}
