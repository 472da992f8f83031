//! The uniform contract every price source implements.

use crate::error::SourceError;
use crate::types::{RawListing, SearchRequest};
use async_trait::async_trait;

/// A single price source (marketplace, retailer API, feed...).
///
/// Adapters are deliberately dumb: they report listings verbatim
/// (price text unparsed) and classify their own failures. Pacing,
/// deadlines, retries and normalization all live outside the adapter.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier, unique across the adapter set.
    fn source_id(&self) -> &str;

    /// Whether this source serves the given region.
    fn supports(&self, region: &str) -> bool;

    /// Fetch listings for a request. Implementations must not retry
    /// internally or sleep for pacing purposes.
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<RawListing>, SourceError>;
}
