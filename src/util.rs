// Utility helpers for parsing cells, guarded arithmetic and number display.
//
// Sheet cells arrive as text regardless of source (CSV, or a spreadsheet cell
// rendered to its display form), so everything here works on `&str`.
use crate::error::{ReportError, Result};
use chrono::Month;
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64`, forgiving the usual export noise.
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

/// Integers may come through as `2025` or, from a float cell, `2025.0`.
pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i32>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(s))?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Month number (1-12) for a full English month name or its three-letter
/// abbreviation, ignoring case and surrounding whitespace.
pub fn parse_month(s: &str) -> Option<u32> {
    s.trim().parse::<Month>().ok().map(|m| m.number_from_month())
}

/// `numerator / denominator`, or `DivisionUndefined` when the denominator is zero.
pub fn safe_div(numerator: f64, denominator: f64, what: &str) -> Result<f64> {
    if denominator == 0.0 {
        return Err(ReportError::DivisionUndefined {
            what: what.to_string(),
        });
    }
    Ok(numerator / denominator)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale thousands separators (e.g. `1,234,567.89`).
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    // Sign follows the rounded value so -0.4 shows as `0`, not `-0`.
    let neg = n.is_sign_negative() && !s.trim_start_matches(['0', '.']).is_empty();
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Like [`format_number`] but renders an undefined value as `N/A`.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    match n {
        Some(v) => format_number(v, decimals),
        None => "N/A".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_with_separators() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parses_float_rendered_years() {
        assert_eq!(parse_i32_safe(Some("2025")), Some(2025));
        assert_eq!(parse_i32_safe(Some("2025.0")), Some(2025));
        assert_eq!(parse_i32_safe(Some("2025.5")), None);
    }

    #[test]
    fn month_names_and_abbreviations() {
        assert_eq!(parse_month("June"), Some(6));
        assert_eq!(parse_month(" jun "), Some(6));
        assert_eq!(parse_month("DECEMBER"), Some(12));
        assert_eq!(parse_month("Smarch"), None);
    }

    #[test]
    fn zero_denominator_is_undefined() {
        assert!(matches!(
            safe_div(1.0, 0.0, "test"),
            Err(ReportError::DivisionUndefined { .. })
        ));
        assert_eq!(safe_div(9.0, 3.0, "test").ok(), Some(3.0));
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 0), "-42");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_number(-0.4, 0), "0");
        assert_eq!(format_number(-0.004, 2), "0.00");
        assert_eq!(format_number(-0.6, 0), "-1");
        assert_eq!(format_opt(None, 1), "N/A");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
