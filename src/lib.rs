//! Multi-source price aggregation and reconciliation.
//!
//! `pricehunt` fans a product query out to a set of heterogeneous
//! price sources, reconciles their listings into clusters of
//! comparable offers, and enriches the result with retrieval-backed
//! market insights.
//!
//! ## Architecture
//!
//! - [`adapter::SourceAdapter`] — the uniform contract a price source
//!   implements; sources report listings verbatim and classify their
//!   own failures.
//! - [`governor::Governor`] — global concurrency ceiling plus
//!   per-source request spacing.
//! - [`orchestrator`] — deadline-bounded concurrent fan-out; a slow or
//!   failing source costs only its own results.
//! - [`normalize`] — price parsing, title normalization, similarity
//!   clustering and deterministic ranking.
//! - [`cache`] — fingerprint-keyed TTL cache with single-flight
//!   computation; partial results expire sooner.
//! - [`knowledge`] / [`insight`] — embedding-based product knowledge
//!   retrieval feeding price analysis, recommendations and market
//!   trends.
//! - [`engine::PriceEngine`] — the facade wiring it all together.
//!
//! ## Example
//!
//! ```no_run
//! use pricehunt::{EngineConfig, PriceEngine, SearchRequest};
//! use pricehunt::knowledge::InMemoryKnowledgeStore;
//! use pricehunt::testing::{sample_knowledge_entries, HashedBagEmbedder, MockAdapter};
//! use std::sync::Arc;
//!
//! # async fn run() -> pricehunt::Result<()> {
//! let knowledge = Arc::new(InMemoryKnowledgeStore::new(
//!     Arc::new(HashedBagEmbedder::default()),
//!     sample_knowledge_entries(),
//! ));
//! let engine = PriceEngine::new(
//!     EngineConfig::default(),
//!     vec![Arc::new(MockAdapter::returning(
//!         "shopmart",
//!         vec![("Apple iPhone 16 Pro", "$999.00")],
//!     ))],
//!     knowledge,
//! )?;
//!
//! let outcome = engine.search(&SearchRequest::new("iPhone 16 Pro", "US")).await?;
//! for cluster in &outcome.results.clusters {
//!     println!("{} from {:?}", cluster.display_name, cluster.min_price());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod governor;
pub mod insight;
pub mod knowledge;
pub mod normalize;
pub mod orchestrator;
pub mod testing;
pub mod types;

pub use adapter::SourceAdapter;
pub use config::EngineConfig;
pub use engine::{PriceEngine, SearchOutcome};
pub use error::{PriceError, Result, SourceError, SourceErrorKind};
pub use types::{
    CanonicalListing, Insight, InsightKind, MatchCluster, PriceStats, PriceVerdict, RawListing,
    ResultSet, SearchRequest,
};
