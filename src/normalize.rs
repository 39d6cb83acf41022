//! Text and number normalization for noisy page fragments
//!
//! Nothing in here fails loudly: a fragment that does not parse yields
//! `None`, which callers treat the same as a field that was never there.

/// Parse a currency/amount fragment like "₹45,999." or "Rs. 1,500.00".
///
/// Keeps digits, `.` and `,`, drops the thousands separators and parses
/// what is left.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();

    // "45,999." comes from a whole-price span that carries its own decimal point
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);

    if cleaned.is_empty() || !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Text before the first `delimiter`, with whitespace collapsed.
///
/// "4.2 out of 5 stars" with " out of" gives "4.2"; "1,234 ratings" with
/// " ratings" gives "1,234". Text without the delimiter is returned whole.
pub fn text_before(text: &str, delimiter: &str) -> Option<String> {
    let head = text.split(delimiter).next().unwrap_or_default();
    let head = clean_text(head);
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

/// Trim, collapse runs of whitespace and drop invisible direction marks.
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{200e}' || c == '\u{200f}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
