//! Dataset loading.
//!
//! A dataset is a JSON document holding the catalog and the rating history:
//!
//! ```json
//! {
//!   "items": [{ "id": 1, "name": "Espresso Cups", "price": 24.0 }],
//!   "ratings": [{ "user_id": 7, "item_id": 1, "rating": 5.0, "timestamp": 0 }]
//! }
//! ```
//!
//! `timestamp` is optional on ratings.

use affinity_core::ratings::{InMemoryRatingStore, ItemId, RatingSample};
use affinity_core::recommend::InMemoryCatalog;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub ratings: Vec<RatingSample>,
}

impl Dataset {
    /// Reads and validates a dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        let dataset = Self::from_json(&json)
            .with_context(|| format!("Invalid dataset: {}", path.display()))?;

        info!(
            "Loaded {} items and {} ratings from {}",
            dataset.items.len(),
            dataset.ratings.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json).context("Failed to parse dataset JSON")?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Rejects duplicate item ids and non-finite values.
    ///
    /// Ratings of items missing from the catalog are kept; they still shape
    /// user vectors and are shown under a placeholder name.
    fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(anyhow!("Duplicate item id {}", item.id));
            }
            if !item.price.is_finite() {
                return Err(anyhow!("Item {} has a non-finite price", item.id));
            }
        }

        if let Some(sample) = self.ratings.iter().find(|s| !s.rating.is_finite()) {
            return Err(anyhow!(
                "Rating of item {} by user {} is not a finite number",
                sample.item_id,
                sample.user_id
            ));
        }

        let unknown = self
            .ratings
            .iter()
            .filter(|s| !seen.contains(&s.item_id))
            .count();
        if unknown > 0 {
            warn!("{} ratings refer to items missing from the catalog", unknown);
        }
        Ok(())
    }

    pub fn catalog(&self) -> InMemoryCatalog {
        InMemoryCatalog::new(
            self.items
                .iter()
                .map(|item| (item.id, item.name.clone(), item.price)),
        )
    }

    pub fn rating_store(&self) -> InMemoryRatingStore {
        InMemoryRatingStore::with_samples(self.ratings.iter().cloned())
    }
}
