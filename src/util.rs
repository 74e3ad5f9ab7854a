// Utility helpers for parsing and basic statistics.
//
// This module centralizes the forgiving number handling for the extract
// columns plus the small numeric helpers shared by the aggregation and
// forecast code.
use chrono::Month;
use num_format::{Locale, ToFormattedString};

/// Leading run of ASCII digits as a number, e.g. `12` for `"12.0"`.
/// `None` when the text does not start with a digit.
pub fn leading_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    let s = s.trim();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Parse a count-like column, falling back to 0.
///
/// Thousands separators are stripped and only the leading integer counts,
/// so `"12.0"` is 12. Text without a leading digit yields 0 and the row is
/// still kept.
pub fn parse_u64_or_zero(s: &str) -> u64 {
    leading_digits(&s.replace(',', "")).unwrap_or(0)
}

pub fn parse_u32_or_zero(s: &str) -> u32 {
    leading_digits(s).unwrap_or(0)
}

/// `100 * part / total`, or 0 when the total is 0.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Relative change in percent; 0 when the base is 0 so callers never see
/// infinities.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from.abs() < f64::EPSILON {
        return 0.0;
    }
    (to - from) / from * 100.0
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Population standard deviation.
pub fn std_dev(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let mean = average(v);
    let variance = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64;
    variance.sqrt()
}

fn month(m: u32) -> Option<Month> {
    u8::try_from(m).ok().and_then(|m| Month::try_from(m).ok())
}

/// Full English month name, or `Month N` outside 1..=12.
pub fn month_name(m: u32) -> String {
    match month(m) {
        Some(mo) => mo.name().to_string(),
        None => format!("Month {}", m),
    }
}

/// Three-letter month abbreviation, or `M{N}` outside 1..=12.
pub fn month_abbrev(m: u32) -> String {
    match month(m) {
        Some(mo) => mo.name()[..3].to_string(),
        None => format!("M{}", m),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
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
    }
    if neg {
        format!("-{}", res)
    } else {
        res
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
    fn counts_fall_back_to_zero() {
        assert_eq!(parse_u64_or_zero(" 42 "), 42);
        assert_eq!(parse_u64_or_zero("1,204"), 1204);
        assert_eq!(parse_u64_or_zero("n/a"), 0);
        assert_eq!(parse_u64_or_zero("-3"), 0);
        assert_eq!(parse_u32_or_zero(""), 0);
        assert_eq!(parse_u32_or_zero("07"), 7);
    }

    #[test]
    fn only_the_leading_integer_counts() {
        assert_eq!(parse_u64_or_zero("12.0"), 12);
        assert_eq!(parse_u64_or_zero("3 units"), 3);
        assert_eq!(parse_u32_or_zero("4.0"), 4);
        assert_eq!(parse_u32_or_zero(".5"), 0);
        assert_eq!(leading_digits::<u32>("110cc"), Some(110));
        assert_eq!(leading_digits::<u32>("cc"), None);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn month_labels() {
        assert_eq!(month_name(4), "April");
        assert_eq!(month_abbrev(12), "Dec");
        assert_eq!(month_name(0), "Month 0");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_int(9855u64), "9,855");
    }

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < 1e-12);
    }
}
