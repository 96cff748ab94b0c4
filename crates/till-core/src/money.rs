//! Integer minor-unit money handling.
//!
//! All monetary amounts in the engine are integer minor units (cents).
//! Formatting to a decimal string happens only at render boundaries
//! (receipts, customer display); arithmetic never leaves the integers.

/// A monetary amount in minor units (cents). Signed because derived
/// values such as the drawer balance can legitimately go negative.
pub type MinorUnits = i64;

/// Formats a minor-unit amount as a plain decimal string, e.g. `5998` → `"59.98"`.
pub fn format_minor(amount: MinorUnits) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parses a decimal string (`"59.98"`, `"500"`, `"-3.5"`) into minor units.
///
/// Accepts at most two fractional digits; a single fractional digit is
/// treated as tenths. Used by configuration loading and tests.
pub fn parse_minor(s: &str) -> Option<MinorUnits> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac_units: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    Some(sign * (whole * 100 + frac_units))
}
