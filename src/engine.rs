//! The engine facade: cache, fan-out, reconciliation, insights.

use crate::adapter::SourceAdapter;
use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::governor::Governor;
use crate::insight::InsightEngine;
use crate::knowledge::KnowledgeStore;
use crate::normalize::{self, title};
use crate::orchestrator::fetch_listings;
use crate::types::{Insight, ResultSet, SearchRequest};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything one search produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Arc<ResultSet>,
    pub insights: Vec<Insight>,
    /// Mirror of `results.partial` for callers that only need the flag.
    pub partial: bool,
}

/// Multi-source price search engine.
///
/// Construction validates the configuration once; a bad config is
/// fatal at startup. The engine is cheap to clone-by-Arc and safe to
/// share across tasks.
pub struct PriceEngine {
    config: EngineConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    governor: Governor,
    cache: ResultCache,
    insights: InsightEngine,
}

impl PriceEngine {
    pub fn new(
        config: EngineConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> Result<Self> {
        config.validate()?;
        let governor = Governor::new(config.max_concurrent_fetches, config.source_spacing);
        let cache = ResultCache::new(
            config.cache_ttl,
            config.partial_cache_ttl,
            config.cache_capacity,
        );
        let insights = InsightEngine::new(knowledge, config.clone());
        Ok(Self {
            config,
            adapters,
            governor,
            cache,
            insights,
        })
    }

    /// Runs a search to completion or the fetch deadline.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        self.search_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like `search`, but the caller can abandon the fan-out early.
    /// A cancelled search leaves no cache entry behind.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let fp = self.fingerprint_of(request);
        let results = self
            .cache
            .get_or_compute(&fp, async {
                let outcome = fetch_listings(
                    &self.adapters,
                    request,
                    &self.governor,
                    self.config.fetch_deadline,
                    cancel,
                )
                .await?;
                let set = normalize::assemble(
                    request,
                    outcome.listings,
                    outcome.failed_sources,
                    Utc::now(),
                    &self.config,
                );
                info!(
                    query = %request.query,
                    region = %request.region,
                    clusters = set.clusters.len(),
                    listings = set.listing_count(),
                    partial = set.partial,
                    "search assembled"
                );
                Ok(Arc::new(set))
            })
            .await?;

        let insights = self.insights.enhance(request, &results).await;
        Ok(SearchOutcome {
            partial: results.partial,
            results,
            insights,
        })
    }

    /// Drops any cached result for this request so the next search
    /// refetches.
    pub async fn invalidate(&self, request: &SearchRequest) {
        self.cache.invalidate(&self.fingerprint_of(request)).await;
    }

    fn fingerprint_of(&self, request: &SearchRequest) -> String {
        let normalized_query = title::normalize(&request.query);
        fingerprint(&normalized_query, &request.region, &request.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeStore;
    use crate::testing::{sample_knowledge_entries, HashedBagEmbedder, MockAdapter};
    use std::time::Duration;

    fn knowledge() -> Arc<dyn KnowledgeStore> {
        Arc::new(InMemoryKnowledgeStore::new(
            Arc::new(HashedBagEmbedder::default()),
            sample_knowledge_entries(),
        ))
    }

    fn quick_config() -> EngineConfig {
        EngineConfig {
            source_spacing: Duration::ZERO,
            fetch_deadline: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = EngineConfig {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        assert!(PriceEngine::new(config, Vec::new(), knowledge()).is_err());
    }

    #[tokio::test]
    async fn search_returns_clustered_results() {
        let engine = PriceEngine::new(
            quick_config(),
            vec![Arc::new(MockAdapter::returning(
                "shopmart",
                vec![("Apple iPhone 16 Pro 128GB", "$999.00")],
            ))],
            knowledge(),
        )
        .expect("engine");

        let outcome = engine
            .search(&SearchRequest::new("iPhone 16 Pro", "US"))
            .await
            .expect("search");
        assert_eq!(outcome.results.clusters.len(), 1);
        assert!(!outcome.partial);
        assert!(!outcome.insights.is_empty());
    }

    #[tokio::test]
    async fn repeated_search_hits_the_cache() {
        let adapter = Arc::new(MockAdapter::returning(
            "shopmart",
            vec![("Widget", "$10.00")],
        ));
        let counter = adapter.clone();
        let engine = PriceEngine::new(quick_config(), vec![adapter], knowledge()).expect("engine");

        let request = SearchRequest::new("widget", "US");
        engine.search(&request).await.expect("first search");
        engine.search(&request).await.expect("second search");
        assert_eq!(counter.call_count(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let adapter = Arc::new(MockAdapter::returning(
            "shopmart",
            vec![("Widget", "$10.00")],
        ));
        let counter = adapter.clone();
        let engine = PriceEngine::new(quick_config(), vec![adapter], knowledge()).expect("engine");

        let request = SearchRequest::new("widget", "US");
        engine.search(&request).await.expect("first search");
        engine.invalidate(&request).await;
        engine.search(&request).await.expect("second search");
        assert_eq!(counter.call_count(), 2);
    }

    #[tokio::test]
    async fn equivalent_requests_share_a_cache_entry() {
        let adapter = Arc::new(MockAdapter::returning(
            "shopmart",
            vec![("Widget", "$10.00")],
        ));
        let counter = adapter.clone();
        let engine = PriceEngine::new(quick_config(), vec![adapter], knowledge()).expect("engine");

        engine
            .search(&SearchRequest::new("Blue  Widget", "US"))
            .await
            .expect("first");
        engine
            .search(&SearchRequest::new("blue widget", "US"))
            .await
            .expect("second");
        assert_eq!(counter.call_count(), 1);
    }
}
