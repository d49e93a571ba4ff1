//! Defensive numeric extraction from upstream display strings.
//!
//! Fare and distance values arrive as UI strings ("₱125.50", "3.2 km",
//! "1,250") and must reach the server as plain numbers. A failed parse is a
//! zero, never an error: a missing fare blocks nothing downstream, the
//! server recomputes authoritative totals anyway.

/// Extracts a non-negative amount from a display string.
///
/// Strips every character that is not an ASCII digit or `.`, then parses the
/// remainder as `f64`. Returns `0.0` when nothing parseable remains.
///
/// `"₱125.50"` → `125.5`, `"1,250"` → `1250.0`, `"abc"` → `0.0`.
#[must_use]
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}
