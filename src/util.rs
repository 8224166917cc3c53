// Utility helpers for cell cleaning, basic statistics and number formatting.
//
// This module centralizes the "dirty" spreadsheet handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};
use regex::Regex;

/// Strip marker glyphs and thousands separators, then trim.
///
/// Returns `None` when nothing numeric-looking is left.
fn clean_numeric_text(s: Option<&str>, marker: &Regex) -> Option<String> {
    let s = s?;
    let stripped = marker.replace_all(s, "");
    let cleaned: String = stripped.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    // Anything alphabetic left over (e.g. "n/a", "low") is not a number.
    // `e`/`E` are excluded so scientific notation still parses.
    if cleaned
        .chars()
        .any(|c| c.is_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    Some(cleaned)
}

/// Parse a consumption cell into `f64`.
///
/// - Accepts `Option<&str>` so callers can pass through missing cells.
/// - Removes every match of `marker` (footnotes like `[x]`).
/// - Strips thousands separators like `","` before parsing.
/// - Rejects non-finite results.
pub fn parse_f64_safe(s: Option<&str>, marker: &Regex) -> Option<f64> {
    let cleaned = clean_numeric_text(s, marker)?;
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a year cell. Spreadsheet exports often store years as `1970.0`,
/// so integral floats are accepted too.
pub fn parse_year_safe(s: Option<&str>, marker: &Regex) -> Option<i32> {
    let cleaned = clean_numeric_text(s, marker)?;
    if let Ok(y) = cleaned.parse::<i32>() {
        return Some(y);
    }
    let f = cleaned.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Trim a label cell; blank labels become `None`.
pub fn clean_label(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// `(b - a) / a * 100`, or `None` on a zero base.
pub fn pct_change(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 {
        None
    } else {
        Some((b - a) / a * 100.0)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_digits(int_part, Locale::en.separator());
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Rounding can turn a tiny negative into zero; don't print "-0.00".
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Insert `sep` every three digits from the right. Works on the digit text so
/// magnitudes beyond any integer type keep their digits.
fn group_digits(digits: &str, sep: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}

/// Percentage cell text: fixed decimals or `"n/a"` for a zero base.
pub fn format_pct(p: Option<f64>, decimals: usize) -> String {
    match p {
        Some(v) => format!("{:.*}", decimals, v),
        None => "n/a".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// File-name friendly form of a label: `"Iron & steel"` -> `"iron_steel"`.
pub fn slug(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

// `display_with` hooks for the `Tabled` derives in `types`.
pub fn display_ktoe(v: &f64) -> String {
    format_number(*v, 2)
}

pub fn display_pct(p: &Option<f64>) -> String {
    format_pct(*p, 2)
}
