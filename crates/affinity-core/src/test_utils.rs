//! Test utilities for affinity-core.
//!
//! Shared fixtures for unit tests: rating samples, a catalog, and scripted
//! collaborators whose behavior (latency, failure) is controlled per test.
//! Only compiled when running tests.

use crate::error::{ClusterError, CollaboratorError};
use crate::ratings::{ItemId, RatingSample, UserId};
use crate::recommend::{
    BaselineItemRecommender, BaselineUserRecommender, ClusterRecommender, InMemoryCatalog,
    ScoredItem,
};
use async_trait::async_trait;
use std::time::Duration;

/// Rating sample with timestamp 0.
pub fn rating(user: u64, item: u64, value: f64) -> RatingSample {
    rating_at(user, item, value, 0)
}

/// Rating sample with an explicit timestamp.
pub fn rating_at(user: u64, item: u64, value: f64, timestamp: u64) -> RatingSample {
    RatingSample {
        user_id: UserId::from_u64(user),
        item_id: ItemId::from_u64(item),
        rating: value,
        timestamp,
    }
}

/// Scored item shorthand.
pub fn scored(item: u64, score: f64) -> ScoredItem {
    ScoredItem::new(ItemId::from_u64(item), score)
}

/// Catalog with items 1..=n named "Item <id>" and priced at `id * 10.0`.
pub fn catalog(n: u64) -> InMemoryCatalog {
    InMemoryCatalog::new(
        (1..=n).map(|id| (ItemId::from_u64(id), format!("Item {}", id), id as f64 * 10.0)),
    )
}

/// How a scripted collaborator answers.
#[derive(Clone)]
pub enum Script {
    /// Answer immediately with these items
    Answer(Vec<ScoredItem>),
    /// Answer with these items after a delay
    Delayed(Duration, Vec<ScoredItem>),
    /// Fail every call
    Fail,
}

impl Script {
    async fn run(&self) -> Result<Vec<ScoredItem>, CollaboratorError> {
        match self {
            Script::Answer(items) => Ok(items.clone()),
            Script::Delayed(delay, items) => {
                tokio::time::sleep(*delay).await;
                Ok(items.clone())
            }
            Script::Fail => Err(CollaboratorError::Failed("scripted failure".to_string())),
        }
    }
}

/// Recommendation source (user-, item- or cluster-based) answering from a script.
pub struct ScriptedRecommender {
    pub script: Script,
}

impl ScriptedRecommender {
    pub fn new(script: Script) -> Self {
        Self { script }
    }
}

#[async_trait]
impl BaselineUserRecommender for ScriptedRecommender {
    async fn recommend(
        &self,
        _user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError> {
        let mut items = self.script.run().await?;
        items.truncate(count);
        Ok(items)
    }
}

#[async_trait]
impl BaselineItemRecommender for ScriptedRecommender {
    async fn recommend_similar(
        &self,
        _item_id: ItemId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, CollaboratorError> {
        let mut items = self.script.run().await?;
        items.truncate(count);
        Ok(items)
    }
}

#[async_trait]
impl ClusterRecommender for ScriptedRecommender {
    async fn recommend_from_cluster(
        &self,
        _user_id: UserId,
        count: usize,
    ) -> Result<Vec<ScoredItem>, ClusterError> {
        let mut items = self
            .script
            .run()
            .await
            .map_err(|e| ClusterError::Store(e.to_string()))?;
        items.truncate(count);
        Ok(items)
    }
}
