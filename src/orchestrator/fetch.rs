//! Deadline-bounded concurrent fetch across all applicable sources.
//!
//! One task per adapter, every task gated by the governor. A failing
//! or slow source costs only its own results: errors are logged and
//! recorded, never propagated, and the deadline aborts stragglers
//! while completed listings are kept.

use crate::adapter::SourceAdapter;
use crate::error::{PriceError, Result};
use crate::governor::Governor;
use crate::types::{RawListing, SearchRequest};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// What one fan-out produced.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Raw listings from every source that answered in time.
    pub listings: Vec<RawListing>,
    /// Sources that failed, timed out, or were cut off by the deadline.
    pub failed_sources: BTreeSet<String>,
}

/// Fans the request out to every adapter supporting its region.
///
/// The deadline is absolute from the moment this function is entered,
/// so slow permit acquisition counts against a source. Returns
/// `PriceError::Cancelled` when `cancel` fires first; per-source
/// failures never surface as errors.
pub async fn fetch_listings(
    adapters: &[Arc<dyn SourceAdapter>],
    request: &SearchRequest,
    governor: &Governor,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<FetchOutcome> {
    let deadline = Instant::now() + deadline;
    let mut outcome = FetchOutcome::default();

    let mut tasks = JoinSet::new();
    let mut pending: BTreeSet<String> = BTreeSet::new();
    for adapter in adapters {
        if !adapter.supports(&request.region) {
            continue;
        }
        pending.insert(adapter.source_id().to_string());
        let adapter = Arc::clone(adapter);
        let governor = governor.clone();
        let request = request.clone();
        tasks.spawn(async move {
            let _permit = governor.acquire(adapter.source_id()).await;
            let fetched = adapter.fetch(&request).await;
            (adapter.source_id().to_string(), fetched)
        });
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tasks.abort_all();
                return Err(PriceError::Cancelled);
            }
            joined = timeout_at(deadline, tasks.join_next()) => match joined {
                Err(_) => {
                    // Deadline hit: abort stragglers, keep what we have.
                    tasks.abort_all();
                    warn!(
                        sources = ?pending,
                        "fetch deadline expired with sources still in flight"
                    );
                    outcome.failed_sources.append(&mut pending);
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok((source, Ok(listings))))) => {
                    pending.remove(&source);
                    outcome.listings.extend(listings);
                }
                Ok(Some(Ok((source, Err(err))))) => {
                    pending.remove(&source);
                    warn!(source = %source, error = %err, "source fetch failed");
                    outcome.failed_sources.insert(source);
                }
                // Panicked task: its source stays in `pending` and is
                // swept into failed_sources below.
                Ok(Some(Err(_))) => {}
            }
        }
    }

    outcome.failed_sources.extend(pending);
    Ok(outcome)
}
