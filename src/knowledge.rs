//! Product knowledge retrieval.
//!
//! Knowledge entries describe products the system knows something
//! about: market price ranges, comparable alternatives, market
//! commentary. Retrieval is embedding-based so lookups tolerate the
//! same phrasing drift as listing titles. The embedding model itself
//! stays behind the `Embedder` trait.

use crate::error::RetrievalError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Known market price band for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
    pub avg: Decimal,
    pub currency: String,
}

/// One product the knowledge base can speak about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub product_name: String,
    pub brand: String,
    pub category: String,
    /// Key specs, free-form ("6.3-inch display", "A18 Pro chip").
    #[serde(default)]
    pub specs: Vec<String>,
    pub price_range: Option<PriceRange>,
    /// Comparable products worth suggesting.
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Market commentary, reported verbatim as a trend insight.
    pub market_insights: String,
}

impl KnowledgeEntry {
    /// Composes the text that gets embedded for this entry. Name and
    /// brand lead so they dominate the embedding.
    pub fn document(&self) -> String {
        let mut parts = vec![
            self.product_name.clone(),
            self.brand.clone(),
            self.category.clone(),
        ];
        parts.extend(self.specs.iter().cloned());
        if !self.alternatives.is_empty() {
            parts.push(format!("alternatives: {}", self.alternatives.join(", ")));
        }
        parts.push(self.market_insights.clone());
        parts.join(". ")
    }
}

/// A knowledge entry with its retrieval score, higher is closer.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: Arc<KnowledgeEntry>,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f64,
}

/// Turns text into a fixed-dimension embedding.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Retrieval capability: embed a query, look up the closest entries.
///
/// Failures are classified, not fatal: the insight engine degrades to
/// fewer insights when the store errors.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// The `k` entries closest to `embedding`, best first.
    async fn lookup(&self, embedding: &[f32], k: usize)
        -> Result<Vec<ScoredEntry>, RetrievalError>;
}

/// Brute-force cosine store over in-memory entries.
///
/// Documents are embedded once at construction and L2-normalized so
/// lookup is a plain dot product. Entries are append-only for the
/// process lifetime.
pub struct InMemoryKnowledgeStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Arc<KnowledgeEntry>, Vec<f32>)>,
}

impl InMemoryKnowledgeStore {
    pub fn new(embedder: Arc<dyn Embedder>, entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let embedding = l2_normalize(embedder.embed(&entry.document()));
                (Arc::new(entry), embedding)
            })
            .collect();
        Self { embedder, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(l2_normalize(self.embedder.embed(text)))
    }

    async fn lookup(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, RetrievalError> {
        let mut scored: Vec<ScoredEntry> = self
            .entries
            .iter()
            .map(|(entry, doc)| ScoredEntry {
                entry: Arc::clone(entry),
                score: dot(embedding, doc) as f64,
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
