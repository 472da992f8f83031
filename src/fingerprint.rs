//! Content-addressed request identity.
//!
//! Two requests that normalize to the same query, region and filter set
//! share a fingerprint, and therefore a cache entry and an in-flight
//! computation.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Computes the cache fingerprint for a request.
///
/// `normalized_query` must already be normalized (see `normalize::title`)
/// so that casing and whitespace differences collapse. Components are
/// fed through the hash with unit separators so adjacent fields cannot
/// run together.
pub fn fingerprint(
    normalized_query: &str,
    region: &str,
    filters: &BTreeMap<String, String>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_query.as_bytes());
    hasher.update([0x1f]);
    hasher.update(region.as_bytes());
    for (key, value) in filters {
        hasher.update([0x1f]);
        hasher.update(key.as_bytes());
        hasher.update([0x1e]);
        hasher.update(value.as_bytes());
    }
    let digest = hasher.finalize();
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        use std::fmt::Write;
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_share_a_fingerprint() {
        let filters = BTreeMap::from([("condition".to_string(), "new".to_string())]);
        let a = fingerprint("iphone 16 pro", "US", &filters);
        let b = fingerprint("iphone 16 pro", "US", &filters);
        assert_eq!(a, b);
    }

    #[test]
    fn region_changes_the_fingerprint() {
        let filters = BTreeMap::new();
        assert_ne!(
            fingerprint("iphone 16 pro", "US", &filters),
            fingerprint("iphone 16 pro", "IN", &filters)
        );
    }

    #[test]
    fn filters_change_the_fingerprint() {
        let none = BTreeMap::new();
        let new_only = BTreeMap::from([("condition".to_string(), "new".to_string())]);
        assert_ne!(
            fingerprint("iphone 16 pro", "US", &none),
            fingerprint("iphone 16 pro", "US", &new_only)
        );
    }

    #[test]
    fn filter_order_is_irrelevant() {
        // BTreeMap iteration is sorted, so insertion order cannot leak in.
        let mut a = BTreeMap::new();
        a.insert("condition".to_string(), "new".to_string());
        a.insert("seller".to_string(), "official".to_string());
        let mut b = BTreeMap::new();
        b.insert("seller".to_string(), "official".to_string());
        b.insert("condition".to_string(), "new".to_string());
        assert_eq!(
            fingerprint("widget", "US", &a),
            fingerprint("widget", "US", &b)
        );
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = fingerprint("widget", "US", &BTreeMap::new());
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
