//! Core data types shared across the crate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A caller's price search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text product query as the user typed it.
    pub query: String,
    /// Marketplace region code, e.g. "US" or "IN".
    pub region: String,
    /// Optional structured filters (key → value), e.g. "condition" → "new".
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Maximum clusters to return. `None` means no truncation.
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            region: region.into(),
            filters: BTreeMap::new(),
            max_results: None,
        }
    }
}

/// A single listing as reported by a source adapter, before normalization.
///
/// `price_text` is whatever the source displayed ("$1,299.00", "₹1.04.999",
/// "1 299,00 €"); parsing happens in the normalizer so adapters stay dumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    /// Identifier of the reporting source.
    pub source_id: String,
    /// Product name as displayed by the source.
    pub product_name: String,
    /// Price text as displayed, currency marker included when present.
    pub price_text: String,
    /// Listing URL at the source.
    pub url: String,
    /// Anything else the source reported (rating, availability, seller...).
    #[serde(default)]
    pub raw_attributes: BTreeMap<String, String>,
}

/// A listing after price parsing and name normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    pub source_id: String,
    /// Human-readable name, verbatim from the source.
    pub product_name: String,
    /// Lowercased, boilerplate-stripped name used for matching only.
    pub normalized_name: String,
    /// Exact decimal price. Never defaulted: unparsable prices drop the listing.
    pub price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    pub url: String,
    /// Source-reported rating when present and parsable, 0.0–5.0.
    pub rating: Option<f64>,
    /// Index of the cluster this listing belongs to, set during assembly.
    pub match_cluster_id: usize,
}

/// A group of listings judged to be the same product across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCluster {
    /// Display name: the human-readable name of the best-matching member.
    pub display_name: String,
    /// Similarity of the best member to the normalized query, 0.0–1.0.
    pub score: f64,
    /// Member listings, price ascending then source_id.
    pub listings: Vec<CanonicalListing>,
}

impl MatchCluster {
    /// Lowest price among members. Clusters are never empty.
    pub fn min_price(&self) -> Option<Decimal> {
        self.listings.iter().map(|l| l.price).min()
    }
}

/// The reconciled, ranked output of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Content-addressed identity of the originating request.
    pub fingerprint: String,
    /// The query after normalization, used for ranking and insight lookup.
    pub normalized_query: String,
    pub region: String,
    /// Clusters ordered score desc, then min price asc, then source.
    pub clusters: Vec<MatchCluster>,
    /// True when at least one applicable source failed or timed out.
    pub partial: bool,
    /// Sources that failed, in stable order.
    pub failed_sources: BTreeSet<String>,
    pub fetched_at: DateTime<Utc>,
}

impl ResultSet {
    /// Distinguishes "nothing found" (all sources answered, no matches)
    /// from "could not check" (no listings and at least one source failed).
    pub fn is_nothing_found(&self) -> bool {
        self.clusters.is_empty() && self.failed_sources.is_empty()
    }

    /// Total listings across all clusters.
    pub fn listing_count(&self) -> usize {
        self.clusters.iter().map(|c| c.listings.len()).sum()
    }
}

/// Kind of insight produced by the retrieval engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightKind {
    PriceAnalysis,
    Recommendation,
    MarketTrend,
}

/// Verdict of the price analysis against known market ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceVerdict {
    GreatDeal,
    Fair,
    AboveMarket,
}

/// A single advisory produced by the retrieval/insight engine.
///
/// Insights are strictly additive: an empty vector is a valid outcome
/// and retrieval failures only ever shrink it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    /// Human-readable summary.
    pub message: String,
    /// Observed price statistics, present on price analysis insights.
    pub price_stats: Option<PriceStats>,
    /// Verdict, present when a confident knowledge match existed.
    pub verdict: Option<PriceVerdict>,
    /// Alternative product names, present on recommendation insights.
    pub alternatives: Vec<String>,
}

/// Exact observed price statistics across all clustered listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min: Decimal,
    pub max: Decimal,
    /// Mean of all listing prices, exact decimal division.
    pub avg: Decimal,
    pub currency: String,
}
