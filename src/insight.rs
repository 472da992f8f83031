//! Retrieval-backed insights over a reconciled result set.
//!
//! Insights are strictly additive. Every stage degrades independently:
//! a failed embedding or lookup means that stage contributes nothing,
//! never an error to the caller. The expanded query built during
//! retrieval is internal and never appears in any output.

use crate::config::EngineConfig;
use crate::knowledge::{KnowledgeStore, ScoredEntry};
use crate::normalize::{similarity::similarity, title};
use crate::types::{
    Insight, InsightKind, PriceStats, PriceVerdict, ResultSet, SearchRequest,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct InsightEngine {
    store: Arc<dyn KnowledgeStore>,
    config: EngineConfig,
}

impl InsightEngine {
    pub fn new(store: Arc<dyn KnowledgeStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Produces insights for a finished search. An empty vector is a
    /// normal outcome, not a failure.
    pub async fn enhance(&self, request: &SearchRequest, results: &ResultSet) -> Vec<Insight> {
        let top = self.retrieve(&request.query).await;
        let mut insights = Vec::new();

        if let Some(stats) = observed_stats(results) {
            let verdict = top
                .as_ref()
                .and_then(|t| t.entry.price_range.as_ref())
                .filter(|range| range.currency == stats.currency)
                .and_then(|range| self.verdict(&stats, range));
            insights.push(price_insight(stats, verdict));
        }

        if let Some(top) = top {
            let remaining = self.novel_alternatives(&top, results);
            if !remaining.is_empty() {
                insights.push(Insight {
                    kind: InsightKind::Recommendation,
                    message: format!("Also consider: {}.", remaining.join(", ")),
                    price_stats: None,
                    verdict: None,
                    alternatives: remaining,
                });
            }
            if !top.entry.market_insights.is_empty() {
                insights.push(Insight {
                    kind: InsightKind::MarketTrend,
                    message: top.entry.market_insights.clone(),
                    price_stats: None,
                    verdict: None,
                    alternatives: Vec::new(),
                });
            }
        }

        insights
    }

    /// Two-pass retrieval: look up the raw query, expand it with the
    /// brand and category terms of the hits, then score the expanded
    /// query. Returns the best hit only when it clears the confidence
    /// threshold.
    async fn retrieve(&self, query: &str) -> Option<ScoredEntry> {
        let k = self.config.retrieval_top_k;
        let first = match self.lookup(query, k).await {
            Ok(hits) => hits,
            Err(err) => {
                debug!(error = %err, "knowledge retrieval failed");
                return None;
            }
        };
        let best_first = first.first()?.clone();

        let query_lower = query.to_lowercase();
        let mut terms: Vec<String> = Vec::new();
        for hit in &first {
            for term in [&hit.entry.brand, &hit.entry.category] {
                let term = term.to_lowercase();
                if !query_lower.contains(&term) && !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }

        let best = if terms.is_empty() {
            best_first
        } else {
            let expanded = format!("{query} {}", terms.join(" "));
            match self.lookup(&expanded, k).await {
                Ok(hits) => hits.into_iter().next().unwrap_or(best_first),
                Err(err) => {
                    debug!(error = %err, "expanded retrieval failed, using first pass");
                    best_first
                }
            }
        };
        (best.score >= self.config.retrieval_confidence).then_some(best)
    }

    async fn lookup(
        &self,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredEntry>, crate::error::RetrievalError> {
        let embedding = self.store.embed(text).await?;
        self.store.lookup(&embedding, k).await
    }

    fn verdict(
        &self,
        stats: &PriceStats,
        range: &crate::knowledge::PriceRange,
    ) -> Option<PriceVerdict> {
        let deal_margin = Decimal::from_f64(self.config.great_deal_margin)?;
        let market_margin = Decimal::from_f64(self.config.above_market_margin)?;
        let deal_floor = range.min * (Decimal::ONE - deal_margin);
        let market_ceiling = range.avg * (Decimal::ONE + market_margin);
        Some(if stats.min < deal_floor {
            PriceVerdict::GreatDeal
        } else if stats.min > market_ceiling {
            PriceVerdict::AboveMarket
        } else {
            PriceVerdict::Fair
        })
    }

    /// Alternatives of the top entry not already present as a result
    /// cluster, by normalized-name similarity.
    fn novel_alternatives(&self, top: &ScoredEntry, results: &ResultSet) -> Vec<String> {
        top.entry
            .alternatives
            .iter()
            .filter(|alt| {
                let normalized = title::normalize(alt);
                !results.clusters.iter().any(|cluster| {
                    cluster.listings.iter().any(|listing| {
                        similarity(&normalized, &listing.normalized_name)
                            >= self.config.cluster_threshold
                    })
                })
            })
            .cloned()
            .collect()
    }
}

/// Exact price statistics over the listings in the set's dominant
/// currency. `None` when no priced listings exist.
fn observed_stats(results: &ResultSet) -> Option<PriceStats> {
    let mut by_currency: HashMap<&str, usize> = HashMap::new();
    for cluster in &results.clusters {
        for listing in &cluster.listings {
            *by_currency.entry(listing.currency.as_str()).or_default() += 1;
        }
    }
    // Dominant currency; lexical tie-break keeps this deterministic.
    let currency = by_currency
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))?
        .0
        .to_string();

    let prices: Vec<Decimal> = results
        .clusters
        .iter()
        .flat_map(|c| &c.listings)
        .filter(|l| l.currency == currency)
        .map(|l| l.price)
        .collect();
    let min = prices.iter().copied().min()?;
    let max = prices.iter().copied().max()?;
    let sum: Decimal = prices.iter().copied().sum();
    let avg = (sum / Decimal::from(prices.len())).round_dp(2);
    Some(PriceStats {
        min,
        max,
        avg,
        currency,
    })
}

fn price_insight(stats: PriceStats, verdict: Option<PriceVerdict>) -> Insight {
    let mut message = format!(
        "Prices range from {} to {} {} (average {}).",
        stats.min, stats.max, stats.currency, stats.avg
    );
    match verdict {
        Some(PriceVerdict::GreatDeal) => {
            message.push_str(" The lowest price is below the typical market range: a great deal.");
        }
        Some(PriceVerdict::Fair) => {
            message.push_str(" Prices are in line with the typical market range.");
        }
        Some(PriceVerdict::AboveMarket) => {
            message.push_str(" The lowest price is above the typical market average.");
        }
        None => {}
    }
    Insight {
        kind: InsightKind::PriceAnalysis,
        message,
        price_stats: Some(stats),
        verdict,
        alternatives: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::knowledge::InMemoryKnowledgeStore;
    use crate::normalize;
    use crate::testing::{sample_knowledge_entries, HashedBagEmbedder};
    use crate::types::RawListing;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    fn engine() -> InsightEngine {
        let store = InMemoryKnowledgeStore::new(
            Arc::new(HashedBagEmbedder::default()),
            sample_knowledge_entries(),
        );
        InsightEngine::new(Arc::new(store), EngineConfig::default())
    }

    fn raw(source: &str, name: &str, price_text: &str) -> RawListing {
        RawListing {
            source_id: source.to_string(),
            product_name: name.to_string(),
            price_text: price_text.to_string(),
            url: format!("https://{source}.example/item"),
            raw_attributes: BTreeMap::new(),
        }
    }

    fn result_set(query: &str, listings: Vec<RawListing>) -> ResultSet {
        normalize::assemble(
            &SearchRequest::new(query, "US"),
            listings,
            BTreeSet::new(),
            Utc::now(),
            &EngineConfig::default(),
        )
    }

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal")
    }

    #[tokio::test]
    async fn price_analysis_reports_exact_stats() {
        let engine = engine();
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![
                raw("shopmart", "Apple iPhone 16 Pro 128GB", "$999.00"),
                raw("megastore", "iPhone 16 Pro 128GB Titanium", "$1,049.00"),
            ],
        );
        let insights = engine.enhance(&request, &results).await;
        let price = insights
            .iter()
            .find(|i| i.kind == InsightKind::PriceAnalysis)
            .expect("price analysis present");
        let stats = price.price_stats.as_ref().expect("stats");
        assert_eq!(stats.min, dec("999"));
        assert_eq!(stats.max, dec("1049"));
        assert_eq!(stats.avg, dec("1024"));
        assert_eq!(price.verdict, Some(PriceVerdict::Fair));
    }

    #[tokio::test]
    async fn below_range_minimum_is_a_great_deal() {
        let engine = engine();
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![raw("shopmart", "Apple iPhone 16 Pro 128GB", "$899.00")],
        );
        let insights = engine.enhance(&request, &results).await;
        let price = insights
            .iter()
            .find(|i| i.kind == InsightKind::PriceAnalysis)
            .expect("price analysis present");
        assert_eq!(price.verdict, Some(PriceVerdict::GreatDeal));
    }

    #[tokio::test]
    async fn far_above_average_is_above_market() {
        let engine = engine();
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![raw("shopmart", "Apple iPhone 16 Pro 1TB", "$1,400.00")],
        );
        let insights = engine.enhance(&request, &results).await;
        let price = insights
            .iter()
            .find(|i| i.kind == InsightKind::PriceAnalysis)
            .expect("price analysis present");
        assert_eq!(price.verdict, Some(PriceVerdict::AboveMarket));
    }

    #[tokio::test]
    async fn recommendations_skip_products_already_in_results() {
        let engine = engine();
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![
                raw("shopmart", "Apple iPhone 16 Pro 128GB", "$999.00"),
                raw("megastore", "Apple iPhone 16", "$799.00"),
            ],
        );
        let insights = engine.enhance(&request, &results).await;
        let rec = insights
            .iter()
            .find(|i| i.kind == InsightKind::Recommendation)
            .expect("recommendation present");
        assert!(!rec.alternatives.iter().any(|a| a == "iPhone 16"));
        assert!(rec
            .alternatives
            .iter()
            .any(|a| a == "Samsung Galaxy S24 Ultra"));
    }

    #[tokio::test]
    async fn market_trend_is_verbatim_knowledge_text() {
        let engine = engine();
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![raw("shopmart", "Apple iPhone 16 Pro 128GB", "$999.00")],
        );
        let insights = engine.enhance(&request, &results).await;
        let trend = insights
            .iter()
            .find(|i| i.kind == InsightKind::MarketTrend)
            .expect("trend present");
        assert_eq!(
            trend.message,
            sample_knowledge_entries()[0].market_insights
        );
    }

    #[tokio::test]
    async fn unknown_product_still_gets_observed_stats() {
        let engine = engine();
        let request = SearchRequest::new("obscure widget xj9", "US");
        let results = result_set(
            "obscure widget xj9",
            vec![raw("shopmart", "Obscure Widget XJ9", "$42.00")],
        );
        let insights = engine.enhance(&request, &results).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::PriceAnalysis);
        assert_eq!(insights[0].verdict, None);
    }

    #[tokio::test]
    async fn empty_results_and_no_match_yield_no_insights() {
        let engine = engine();
        let request = SearchRequest::new("zzz qqq nothing", "US");
        let results = result_set("zzz qqq nothing", vec![]);
        assert!(engine.enhance(&request, &results).await.is_empty());
    }

    struct FailingStore;

    #[async_trait]
    impl KnowledgeStore for FailingStore {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            Err(RetrievalError("embedder offline".into()))
        }

        async fn lookup(
            &self,
            _embedding: &[f32],
            _k: usize,
        ) -> Result<Vec<ScoredEntry>, RetrievalError> {
            Err(RetrievalError("index offline".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_degrades_to_stats_only() {
        let engine = InsightEngine::new(Arc::new(FailingStore), EngineConfig::default());
        let request = SearchRequest::new("iPhone 16 Pro", "US");
        let results = result_set(
            "iPhone 16 Pro",
            vec![raw("shopmart", "Apple iPhone 16 Pro 128GB", "$999.00")],
        );
        let insights = engine.enhance(&request, &results).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::PriceAnalysis);
        assert_eq!(insights[0].verdict, None);
    }
}
