//! Engine configuration.
//!
//! This module contains the default constants for clustering and score
//! fusion, and the serde-deserializable [`EngineConfig`] that groups them.
//! Every config struct has a `Default` built from the constants and a
//! `validate()` that rejects out-of-range values.
//!
//! # Usage
//!
//! ```
//! use affinity_core::config::{EngineConfig, DEFAULT_VIGILANCE};
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.clustering.vigilance, DEFAULT_VIGILANCE);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Clustering
// =============================================================================

/// Default vigilance (resonance threshold on cosine similarity).
///
/// Higher values produce more, tighter clusters.
pub const DEFAULT_VIGILANCE: f64 = 0.9;

/// Default learning rate used to move a prototype toward a new member.
pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

// =============================================================================
// Score fusion
// =============================================================================

/// Weight of the user-based baseline recommender in the merged score.
pub const DEFAULT_USER_WEIGHT: f64 = 0.4;

/// Weight of the item-based baseline recommender in the merged score.
pub const DEFAULT_ITEM_WEIGHT: f64 = 0.3;

/// Weight of the cluster-based recommender in the merged score.
pub const DEFAULT_CLUSTER_WEIGHT: f64 = 0.3;

/// Lower bound of the display score range.
pub const DISPLAY_SCORE_MIN: f64 = 0.1;

/// Upper bound of the display score range.
pub const DISPLAY_SCORE_MAX: f64 = 9.9;

/// Per-source timeout for collaborator calls, in milliseconds.
///
/// A source that does not answer in time contributes an empty list.
pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// Reference baseline recommenders
// =============================================================================

/// Number of nearest neighbours used by the user-based reference recommender.
pub const DEFAULT_NEIGHBORHOOD_SIZE: usize = 10;

/// Parameters of the ART clustering protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Resonance threshold in [0, 1]
    pub vigilance: f64,
    /// Prototype learning rate in (0, 1]
    pub learning_rate: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            vigilance: DEFAULT_VIGILANCE,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl ClusteringConfig {
    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if vigilance is outside [0, 1] or the
    /// learning rate is outside (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.vigilance) {
            return Err(ConfigError::Invalid(format!(
                "vigilance must be in [0, 1], got {}",
                self.vigilance
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Per-source weights for the merged score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    /// User-based baseline recommender
    pub user_based: f64,
    /// Item-based baseline recommender
    pub item_based: f64,
    /// Cluster-based recommender
    pub cluster_based: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            user_based: DEFAULT_USER_WEIGHT,
            item_based: DEFAULT_ITEM_WEIGHT,
            cluster_based: DEFAULT_CLUSTER_WEIGHT,
        }
    }
}

impl SourceWeights {
    /// Validate weights: all finite and non-negative, at least one positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [self.user_based, self.item_based, self.cluster_based];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "source weights must be finite and non-negative, got {:?}",
                weights
            )));
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(ConfigError::Invalid(
                "at least one source weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the recommendation composer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Weights applied to each source before merging
    pub weights: SourceWeights,
    /// Timeout per collaborator call, in milliseconds
    pub source_timeout_ms: u64,
    /// Lower bound of the normalized display score
    pub display_min: f64,
    /// Upper bound of the normalized display score
    pub display_max: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            weights: SourceWeights::default(),
            source_timeout_ms: DEFAULT_SOURCE_TIMEOUT_MS,
            display_min: DISPLAY_SCORE_MIN,
            display_max: DISPLAY_SCORE_MAX,
        }
    }
}

impl ComposerConfig {
    /// Timeout applied to each collaborator call.
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.source_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "source_timeout_ms must be > 0".to_string(),
            ));
        }
        if !(self.display_min.is_finite()
            && self.display_max.is_finite()
            && self.display_min < self.display_max)
        {
            return Err(ConfigError::Invalid(format!(
                "display range must satisfy min < max, got [{}, {}]",
                self.display_min, self.display_max
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
///
/// Missing fields in a JSON config file fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ART clustering parameters
    pub clustering: ClusteringConfig,
    /// Composer (fusion and timeout) parameters
    pub composer: ComposerConfig,
    /// Neighbourhood size of the user-based reference recommender
    pub neighborhood_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            composer: ComposerConfig::default(),
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
        }
    }
}

impl EngineConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clustering.validate()?;
        self.composer.validate()?;
        if self.neighborhood_size == 0 {
            return Err(ConfigError::Invalid(
                "neighborhood_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON config document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::Invalid(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
