//! Engine configuration.

use crate::error::{PriceError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable parameters for the price engine.
///
/// Validated once at engine construction; a bad value is fatal at
/// startup rather than degrading individual requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global ceiling on concurrently executing source fetches.
    pub max_concurrent_fetches: usize,
    /// Minimum spacing between consecutive requests to the same source.
    /// Zero disables per-source pacing.
    pub source_spacing: Duration,
    /// Absolute deadline for one fan-out, measured from orchestration start.
    pub fetch_deadline: Duration,
    /// Minimum pairwise similarity for two listings to share a cluster.
    pub cluster_threshold: f64,
    /// Time-to-live for complete cached result sets.
    pub cache_ttl: Duration,
    /// Shorter time-to-live for partial result sets, so sources that
    /// failed get retried sooner.
    pub partial_cache_ttl: Duration,
    /// Maximum number of cached result sets.
    pub cache_capacity: u64,
    /// Knowledge entries retrieved per lookup.
    pub retrieval_top_k: usize,
    /// Minimum retrieval score for knowledge-backed insights.
    pub retrieval_confidence: f64,
    /// A price this fraction below the known range minimum is a great deal.
    pub great_deal_margin: f64,
    /// A price this fraction above the known average is above market.
    pub above_market_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            source_spacing: Duration::from_millis(500),
            fetch_deadline: Duration::from_secs(10),
            cluster_threshold: 0.78,
            cache_ttl: Duration::from_secs(600),
            partial_cache_ttl: Duration::from_secs(120),
            cache_capacity: 100,
            retrieval_top_k: 3,
            retrieval_confidence: 0.5,
            great_deal_margin: 0.0,
            above_market_margin: 0.10,
        }
    }
}

impl EngineConfig {
    /// Validates configuration values, returning an error describing
    /// the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(PriceError::Config(
                "max_concurrent_fetches must be greater than zero".into(),
            ));
        }
        if self.fetch_deadline.is_zero() {
            return Err(PriceError::Config(
                "fetch_deadline must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.cluster_threshold) {
            return Err(PriceError::Config(
                "cluster_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.cache_ttl.is_zero() {
            return Err(PriceError::Config(
                "cache_ttl must be greater than zero".into(),
            ));
        }
        if self.partial_cache_ttl.is_zero() {
            return Err(PriceError::Config(
                "partial_cache_ttl must be greater than zero".into(),
            ));
        }
        if self.partial_cache_ttl > self.cache_ttl {
            return Err(PriceError::Config(
                "partial_cache_ttl must not exceed cache_ttl".into(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(PriceError::Config(
                "cache_capacity must be greater than zero".into(),
            ));
        }
        if self.retrieval_top_k == 0 {
            return Err(PriceError::Config(
                "retrieval_top_k must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval_confidence) {
            return Err(PriceError::Config(
                "retrieval_confidence must be between 0.0 and 1.0".into(),
            ));
        }
        if self.great_deal_margin < 0.0 {
            return Err(PriceError::Config(
                "great_deal_margin must not be negative".into(),
            ));
        }
        if self.above_market_margin < 0.0 {
            return Err(PriceError::Config(
                "above_market_margin must not be negative".into(),
            ));
        }
        Ok(())
    }
}
