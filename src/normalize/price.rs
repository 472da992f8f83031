//! Price-text parsing.
//!
//! Sources display prices however they like ("$1,299.00", "₹1,04,999",
//! "1.299,00 EUR"). This module turns that text into an exact decimal
//! and an ISO 4217 currency code, or rejects the listing outright —
//! a price is never guessed or defaulted.

use rust_decimal::Decimal;

/// Symbol markers, matched anywhere in the text.
const SYMBOL_MARKERS: &[(&str, &str)] = &[
    ("₹", "INR"),
    ("$", "USD"),
    ("£", "GBP"),
    ("€", "EUR"),
    ("¥", "JPY"),
];

/// Word-form markers, matched only on token boundaries so "rs" never
/// fires inside ordinary words like "dollars". Checked in order so
/// multi-character markers win over their prefixes.
const WORD_MARKERS: &[(&str, &str)] = &[
    ("rs.", "INR"),
    ("rs", "INR"),
    ("usd", "USD"),
    ("inr", "INR"),
    ("gbp", "GBP"),
    ("eur", "EUR"),
    ("jpy", "JPY"),
];

/// Default currency when the price text carries no marker.
fn region_default(region: &str) -> &'static str {
    match region {
        "IN" => "INR",
        "GB" | "UK" => "GBP",
        "DE" | "FR" | "ES" | "IT" | "NL" | "EU" => "EUR",
        "JP" => "JPY",
        // "US" and anything unrecognized.
        _ => "USD",
    }
}

/// Parses a displayed price into `(amount, currency)`.
///
/// Returns `None` for text with no digits, negative amounts, zero, or
/// anything that does not survive separator disambiguation.
pub fn parse_price(text: &str, region: &str) -> Option<(Decimal, String)> {
    let lowered = text.to_lowercase();
    let currency = SYMBOL_MARKERS
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .or_else(|| {
            WORD_MARKERS
                .iter()
                .find(|(marker, _)| contains_delimited(&lowered, marker))
        })
        .map(|(_, code)| *code)
        .unwrap_or_else(|| region_default(region));

    let amount = extract_amount(&lowered)?;
    if amount <= Decimal::ZERO {
        return None;
    }
    Some((amount, currency.to_string()))
}

/// True when `marker` occurs with no alphanumeric neighbor on either
/// side. Markers are ASCII, so the byte offsets land on char
/// boundaries.
fn contains_delimited(text: &str, marker: &str) -> bool {
    let mut start = 0;
    while let Some(found) = text[start..].find(marker) {
        let begin = start + found;
        let end = begin + marker.len();
        let before_ok = text[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

/// Pulls the numeric portion out of price text and resolves whether
/// `,` and `.` are thousands or decimal separators.
fn extract_amount(text: &str) -> Option<Decimal> {
    let first_digit = text.find(|c: char| c.is_ascii_digit())?;
    // A minus sign before the number (currency marker allowed in
    // between, as in "-$5.00") means a negative price.
    let negative = text[..first_digit]
        .chars()
        .rev()
        .find(|c| !c.is_whitespace() && !c.is_alphabetic() && !"₹$£€¥.".contains(*c))
        == Some('-');
    if negative {
        return None;
    }

    let numeric: String = text[first_digit..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == ' ')
        .filter(|c| *c != ' ')
        .collect();
    let numeric = numeric.trim_end_matches(['.', ',']);
    if numeric.is_empty() {
        return None;
    }

    let has_comma = numeric.contains(',');
    let has_dot = numeric.contains('.');
    let canonical = match (has_comma, has_dot) {
        (true, true) => {
            // Rightmost separator is the decimal point; the other is grouping.
            let last_comma = numeric.rfind(',').unwrap_or(0);
            let last_dot = numeric.rfind('.').unwrap_or(0);
            if last_dot > last_comma {
                numeric.replace(',', "")
            } else {
                numeric.replace('.', "").replace(',', ".")
            }
        }
        (true, false) => resolve_single_separator(numeric, ','),
        (false, true) => resolve_single_separator(numeric, '.'),
        (false, false) => numeric.to_string(),
    };

    canonical.parse::<Decimal>().ok()
}

/// One separator kind present: a single occurrence followed by one or
/// two digits reads as a decimal point, anything else as grouping.
fn resolve_single_separator(numeric: &str, sep: char) -> String {
    let count = numeric.matches(sep).count();
    let trailing = numeric
        .rsplit(sep)
        .next()
        .map(str::len)
        .unwrap_or_default();
    if count == 1 && (1..=2).contains(&trailing) {
        numeric.replace(sep, ".")
    } else {
        numeric.replace(sep, "")
    }
}
