//! Product-name normalization for matching.
//!
//! The normalized name is for comparison only; the human-readable
//! `product_name` always keeps the source's original text.

/// Marketing filler that carries no product identity.
const BOILERPLATE: &[&str] = &[
    "new",
    "brand",
    "genuine",
    "original",
    "official",
    "authentic",
    "sale",
    "discount",
    "offer",
    "deal",
    "hot",
    "best",
    "latest",
    "free",
    "shipping",
    "buy",
];

/// Lowercases, maps punctuation to spaces, strips marketing boilerplate
/// tokens and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered
        .split_whitespace()
        .filter(|token| !BOILERPLATE.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
