//! Product-name similarity.
//!
//! Listings for the same product rarely share exact titles: sources
//! reorder tokens, add color or packaging words, or drop the brand.
//! The score blends fuzzy token-set overlap (robust to reordering and
//! extra tokens) with whole-string Jaro-Winkler over the sorted tokens
//! (robust to small spelling differences), then penalizes titles whose
//! variant markers disagree so "iPhone 16" and "iPhone 16 Pro" stay
//! distinct products.

use strsim::jaro_winkler;

/// Weight of the fuzzy token-set component.
const TOKEN_WEIGHT: f64 = 0.7;
/// Weight of the sorted-string component.
const STRING_WEIGHT: f64 = 0.3;
/// Minimum per-token Jaro-Winkler for two tokens to count as matched.
const TOKEN_MATCH_FLOOR: f64 = 0.85;
/// Multiplier applied when variant-marker sets differ.
const VARIANT_PENALTY: f64 = 0.8;

/// Model-variant markers that change product identity even though the
/// rest of the title matches.
const VARIANT_MARKERS: &[&str] = &[
    "pro", "max", "plus", "ultra", "mini", "lite", "air", "se", "xl", "fold", "flip",
];

/// Scores two normalized product names in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let token_score = fuzzy_token_dice(&tokens_a, &tokens_b);
    let string_score = jaro_winkler(&sorted_join(&tokens_a), &sorted_join(&tokens_b));
    let mut score = TOKEN_WEIGHT * token_score + STRING_WEIGHT * string_score;

    if variant_markers(&tokens_a) != variant_markers(&tokens_b) {
        score *= VARIANT_PENALTY;
    }
    score.clamp(0.0, 1.0)
}

/// Dice coefficient over fuzzily-matched tokens.
///
/// Each token of the shorter side greedily claims its best unclaimed
/// counterpart. Tokens containing digits (model numbers, capacities)
/// must match exactly: "16" and "15" are one edit apart but are
/// different products.
fn fuzzy_token_dice(a: &[&str], b: &[&str]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut claimed = vec![false; long.len()];
    let mut matches = 0usize;

    for token in short {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in long.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            let score = if has_digit(token) || has_digit(candidate) {
                if token == candidate {
                    1.0
                } else {
                    0.0
                }
            } else {
                jaro_winkler(token, candidate)
            };
            if score >= TOKEN_MATCH_FLOOR && best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        if let Some((i, _)) = best {
            claimed[i] = true;
            matches += 1;
        }
    }

    2.0 * matches as f64 / (a.len() + b.len()) as f64
}

fn sorted_join(tokens: &[&str]) -> String {
    let mut sorted: Vec<&str> = tokens.to_vec();
    sorted.sort_unstable();
    sorted.join(" ")
}

fn variant_markers<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    let mut markers: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| VARIANT_MARKERS.contains(t))
        .collect();
    markers.sort_unstable();
    markers.dedup();
    markers
}

fn has_digit(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_one() {
        let score = similarity("apple iphone 16 pro", "apple iphone 16 pro");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reordered_and_partial_titles_cluster() {
        // Same product, different source phrasings.
        let score = similarity(
            "apple iphone 16 pro 128gb titanium",
            "iphone 16 pro 128gb natural titanium",
        );
        assert!(score >= 0.78, "score was {score}");
    }

    #[test]
    fn variant_markers_keep_models_apart() {
        let score = similarity("iphone 16", "iphone 16 pro");
        assert!(score < 0.78, "score was {score}");
    }

    #[test]
    fn different_model_numbers_do_not_cluster() {
        let score = similarity("iphone 16 pro", "iphone 15 pro");
        assert!(score < 0.78, "score was {score}");
    }

    #[test]
    fn different_capacities_do_not_fuzzy_match() {
        let a = similarity("galaxy s24 ultra 256gb", "galaxy s24 ultra 512gb");
        let b = similarity("galaxy s24 ultra 256gb", "galaxy s24 ultra 256gb");
        assert!(a < b);
    }

    #[test]
    fn unrelated_products_score_low() {
        let score = similarity("apple iphone 16 pro", "sony wh 1000xm5 headphones");
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn empty_inputs() {
        assert!((similarity("", "") - 1.0).abs() < 1e-9);
        assert!(similarity("iphone", "").abs() < 1e-9);
    }

    #[test]
    fn symmetric() {
        let a = "apple iphone 16 pro 128gb titanium";
        let b = "iphone 16 pro 128gb natural titanium";
        assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-9);
    }
}
