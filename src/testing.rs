//! Test support: mock adapters, a deterministic embedder, and
//! knowledge fixtures. Used by unit and integration tests; not part
//! of the stable API.

use crate::adapter::SourceAdapter;
use crate::error::SourceError;
use crate::knowledge::{Embedder, KnowledgeEntry, PriceRange};
use crate::types::{RawListing, SearchRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

enum Behavior {
    Listings(Vec<RawListing>),
    Fail,
    Hang,
    Panic,
}

/// A scripted source adapter that records how often it was called.
pub struct MockAdapter {
    source_id: String,
    /// Regions served; `None` serves every region.
    regions: Option<Vec<String>>,
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockAdapter {
    /// Returns the given `(name, price_text)` listings on every call.
    pub fn returning(source_id: &str, items: Vec<(&str, &str)>) -> Self {
        let listings = items
            .into_iter()
            .enumerate()
            .map(|(i, (name, price_text))| RawListing {
                source_id: source_id.to_string(),
                product_name: name.to_string(),
                price_text: price_text.to_string(),
                url: format!("https://{source_id}.example/item/{i}"),
                raw_attributes: BTreeMap::new(),
            })
            .collect();
        Self::with_behavior(source_id, Behavior::Listings(listings))
    }

    /// Always reports `SourceErrorKind::Unavailable`.
    pub fn failing(source_id: &str) -> Self {
        Self::with_behavior(source_id, Behavior::Fail)
    }

    /// Never answers; only a deadline or abort ends the call.
    pub fn hanging(source_id: &str) -> Self {
        Self::with_behavior(source_id, Behavior::Hang)
    }

    /// Panics inside the fetch, simulating a buggy adapter.
    pub fn panicking(source_id: &str) -> Self {
        Self::with_behavior(source_id, Behavior::Panic)
    }

    fn with_behavior(source_id: &str, behavior: Behavior) -> Self {
        Self {
            source_id: source_id.to_string(),
            regions: None,
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Restricts the adapter to the given regions.
    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = Some(regions.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times `fetch` ran.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn supports(&self, region: &str) -> bool {
        self.regions
            .as_ref()
            .map_or(true, |regions| regions.iter().any(|r| r == region))
    }

    async fn fetch(&self, _request: &SearchRequest) -> Result<Vec<RawListing>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            Behavior::Listings(listings) => Ok(listings.clone()),
            Behavior::Fail => Err(SourceError::unavailable("scripted failure")),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Behavior::Panic => panic!("scripted adapter panic"),
        }
    }
}

/// Deterministic bag-of-words embedder: each token hashes into one of
/// `dim` buckets. No semantics, but stable and good enough for lexical
/// overlap, which is all the fixtures need.
pub struct HashedBagEmbedder {
    dim: usize,
}

impl Default for HashedBagEmbedder {
    fn default() -> Self {
        Self { dim: 512 }
    }
}

impl Embedder for HashedBagEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        for token in cleaned.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        v
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal fixture")
}

/// Knowledge fixtures covering a few well-known products.
pub fn sample_knowledge_entries() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry {
            product_name: "iPhone 16 Pro".to_string(),
            brand: "Apple".to_string(),
            category: "smartphone".to_string(),
            specs: vec![
                "6.3-inch Pro display".to_string(),
                "A18 Pro chip".to_string(),
                "titanium design".to_string(),
            ],
            price_range: Some(PriceRange {
                min: dec("999"),
                max: dec("1599"),
                avg: dec("1200"),
                currency: "USD".to_string(),
            }),
            alternatives: vec![
                "iPhone 16".to_string(),
                "Samsung Galaxy S24 Ultra".to_string(),
                "Google Pixel 9".to_string(),
            ],
            market_insights: "Strong demand at launch; street prices typically soften \
                              within six months."
                .to_string(),
        },
        KnowledgeEntry {
            product_name: "iPhone 16".to_string(),
            brand: "Apple".to_string(),
            category: "smartphone".to_string(),
            specs: vec!["6.1-inch display".to_string(), "A18 chip".to_string()],
            price_range: Some(PriceRange {
                min: dec("799"),
                max: dec("1099"),
                avg: dec("900"),
                currency: "USD".to_string(),
            }),
            alternatives: vec![
                "iPhone 15".to_string(),
                "Samsung Galaxy S24".to_string(),
                "Google Pixel 9".to_string(),
            ],
            market_insights: "Base model holds value well; discounts cluster around \
                              carrier promotions."
                .to_string(),
        },
        KnowledgeEntry {
            product_name: "Samsung Galaxy S24 Ultra".to_string(),
            brand: "Samsung".to_string(),
            category: "smartphone".to_string(),
            specs: vec!["6.8-inch display".to_string(), "S Pen included".to_string()],
            price_range: Some(PriceRange {
                min: dec("1099"),
                max: dec("1659"),
                avg: dec("1300"),
                currency: "USD".to_string(),
            }),
            alternatives: vec![
                "Samsung Galaxy S24".to_string(),
                "Google Pixel 9".to_string(),
            ],
            market_insights: "Street prices drop sharply once the next generation is \
                              announced."
                .to_string(),
        },
        KnowledgeEntry {
            product_name: "MacBook Air M2".to_string(),
            brand: "Apple".to_string(),
            category: "laptop".to_string(),
            specs: vec!["13.6-inch display".to_string(), "M2 chip".to_string()],
            price_range: Some(PriceRange {
                min: dec("899"),
                max: dec("1499"),
                avg: dec("1050"),
                currency: "USD".to_string(),
            }),
            alternatives: vec!["MacBook Air M3".to_string(), "Dell XPS 13".to_string()],
            market_insights: "Frequently discounted since the M3 refresh.".to_string(),
        },
    ]
}
