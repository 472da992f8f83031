//! Normalization and reconciliation: raw listings in, ranked `ResultSet` out.
//!
//! `assemble` is a pure function of the listing set. Inputs are
//! pre-sorted before clustering so arrival order from the concurrent
//! fan-out never changes the output.

pub mod cluster;
pub mod price;
pub mod similarity;
pub mod title;

use crate::config::EngineConfig;
use crate::fingerprint::fingerprint;
use crate::types::{CanonicalListing, MatchCluster, RawListing, ResultSet, SearchRequest};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

/// Builds the final `ResultSet` from the orchestrator's raw output.
pub fn assemble(
    request: &SearchRequest,
    raw: Vec<RawListing>,
    failed_sources: BTreeSet<String>,
    fetched_at: DateTime<Utc>,
    config: &EngineConfig,
) -> ResultSet {
    let normalized_query = title::normalize(&request.query);
    let fp = fingerprint(&normalized_query, &request.region, &request.filters);

    let mut listings = canonicalize(raw, &request.region);
    // Deterministic input order for clustering and ranking.
    listings.sort_by(|a, b| {
        (&a.source_id, &a.normalized_name, &a.url).cmp(&(&b.source_id, &b.normalized_name, &b.url))
    });

    let names: Vec<&str> = listings.iter().map(|l| l.normalized_name.as_str()).collect();
    let ids = cluster::cluster(&names, config.cluster_threshold);
    let cluster_count = ids.iter().copied().max().map_or(0, |m| m + 1);

    let mut clusters: Vec<MatchCluster> = Vec::with_capacity(cluster_count);
    for cluster_id in 0..cluster_count {
        let mut members: Vec<CanonicalListing> = listings
            .iter()
            .zip(&ids)
            .filter(|(_, id)| **id == cluster_id)
            .map(|(l, _)| l.clone())
            .collect();
        members.sort_by(|a, b| (a.price, &a.source_id).cmp(&(b.price, &b.source_id)));

        let (display_name, score) = members
            .iter()
            .map(|m| {
                (
                    m.product_name.clone(),
                    similarity::similarity(&m.normalized_name, &normalized_query),
                )
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or_default();

        clusters.push(MatchCluster {
            display_name,
            score,
            listings: members,
        });
    }

    clusters.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.min_price().cmp(&b.min_price()))
            .then_with(|| {
                let sa = a.listings.first().map(|l| l.source_id.as_str()).unwrap_or("");
                let sb = b.listings.first().map(|l| l.source_id.as_str()).unwrap_or("");
                sa.cmp(sb)
            })
    });

    if let Some(max) = request.max_results {
        clusters.truncate(max);
    }

    // Cluster ids reflect the final ranked order.
    for (id, cluster) in clusters.iter_mut().enumerate() {
        for listing in &mut cluster.listings {
            listing.match_cluster_id = id;
        }
    }

    ResultSet {
        fingerprint: fp,
        normalized_query,
        region: request.region.clone(),
        clusters,
        partial: !failed_sources.is_empty(),
        failed_sources,
        fetched_at,
    }
}

/// Parses prices and normalizes names, dropping listings that cannot
/// yield an exact price or a matchable name.
fn canonicalize(raw: Vec<RawListing>, region: &str) -> Vec<CanonicalListing> {
    raw.into_iter()
        .filter_map(|listing| {
            let Some((price, currency)) = price::parse_price(&listing.price_text, region) else {
                debug!(
                    source = %listing.source_id,
                    price_text = %listing.price_text,
                    "dropping listing with unparsable price"
                );
                return None;
            };
            let normalized_name = title::normalize(&listing.product_name);
            if normalized_name.is_empty() {
                debug!(
                    source = %listing.source_id,
                    name = %listing.product_name,
                    "dropping listing with empty normalized name"
                );
                return None;
            }
            let rating = listing
                .raw_attributes
                .get("rating")
                .and_then(|r| r.parse::<f64>().ok())
                .filter(|r| (0.0..=5.0).contains(r));
            Some(CanonicalListing {
                source_id: listing.source_id,
                product_name: listing.product_name,
                normalized_name,
                price,
                currency,
                url: listing.url,
                rating,
                match_cluster_id: 0,
            })
        })
        .collect()
}
