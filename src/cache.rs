//! Fingerprint-keyed result cache with single-flight computation.
//!
//! Partial result sets live under a shorter TTL so failed sources get
//! retried sooner. Expired entries are simply absent; the cache never
//! serves stale data.

use crate::error::{PriceError, Result};
use crate::types::ResultSet;
use moka::future::Cache;
use moka::Expiry;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-entry expiry: complete sets use `ttl`, partial sets `partial_ttl`.
struct ResultExpiry {
    ttl: Duration,
    partial_ttl: Duration,
}

impl Expiry<String, Arc<ResultSet>> for ResultExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<ResultSet>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(if value.partial { self.partial_ttl } else { self.ttl })
    }
}

/// TTL cache of reconciled result sets.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<String, Arc<ResultSet>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, partial_ttl: Duration, capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(ResultExpiry { ttl, partial_ttl })
            .build();
        Self { inner }
    }

    /// Returns the cached set for `fingerprint`, or runs `compute` to
    /// produce it. Concurrent callers for the same fingerprint share a
    /// single computation; the rest await its outcome. A computation
    /// that returns an error inserts nothing, so a cancelled search
    /// never poisons the cache.
    pub async fn get_or_compute<F>(&self, fingerprint: &str, compute: F) -> Result<Arc<ResultSet>>
    where
        F: Future<Output = Result<Arc<ResultSet>>>,
    {
        let entry = self
            .inner
            .entry(fingerprint.to_string())
            .or_try_insert_with(compute)
            .await
            .map_err(|e: Arc<PriceError>| (*e).clone())?;
        Ok(entry.into_value())
    }

    /// Cached set for `fingerprint`, if present and unexpired.
    pub async fn get(&self, fingerprint: &str) -> Option<Arc<ResultSet>> {
        self.inner.get(fingerprint).await
    }

    /// Drops the entry for `fingerprint` so the next lookup recomputes.
    pub async fn invalidate(&self, fingerprint: &str) {
        self.inner.invalidate(fingerprint).await;
    }
}
