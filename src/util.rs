// Number parsing and formatting helpers.
//
// Cells arrive as text from the loader; everything past the validator
// works with typed values and only comes back here for display.
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64`, forgiving the formatting quirks common in
/// spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer-like cell. `"2024"` and `"2024.0"` are accepted,
/// `"2024.5"` is not.
pub fn parse_int_like(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.replace(',', "").parse::<i64>() {
        return Some(v);
    }
    let v = parse_f64_safe(Some(s))?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// `numerator / denominator`, or `NaN` when the denominator is zero.
///
/// Undefined ratios must never read as zero, which would understate them.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return "NaN".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_digits(int_part);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Insert `Locale::en` thousands separators into a plain digit string of
/// any length.
fn group_digits(digits: &str) -> String {
    let sep = Locale::en.separator();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * sep.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(c);
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Counts are summed as `f64`; render them back as whole numbers.
pub fn format_count(n: f64) -> String {
    if !n.is_finite() {
        return "NaN".to_string();
    }
    format_number(n.round(), 0)
}

pub fn format_money(n: f64) -> String {
    if n.is_finite() {
        format!("GHS {}", format_number(n, 2))
    } else {
        "NaN".to_string()
    }
}
