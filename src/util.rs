// Utility helpers for value normalization and basic statistics.
//
// This module centralizes all the "dirty" cell/number handling so the
// rest of the code can assume clean, typed values.
use crate::types::Cell;
use num_format::{Locale, ToFormattedString};

/// Outcome of normalizing one raw completion-rate cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RateParse {
    /// A usable percentage in [0, 100].
    Value(f64),
    /// Blank/empty cell; skipped silently.
    Missing,
    /// Text that was not a parsable percentage; dropped with a warning.
    Invalid(String),
}

/// Normalize a raw completion-rate cell to a percentage.
///
/// - Text ending in `%` is stripped and parsed (`"92%"` → 92.0).
/// - A numeric value ≤ 1 is treated as a fraction (`0.85` → 85.0).
/// - A numeric value > 1 is already a percentage and used as-is.
/// - Results are clamped to [0, 100] so means stay in range.
/// - Any other text is `Invalid`; blank cells are `Missing`.
pub fn normalize_rate(cell: &Cell) -> RateParse {
    match cell {
        Cell::Empty => RateParse::Missing,
        Cell::Number(n) if !n.is_finite() => RateParse::Missing,
        Cell::Number(n) => {
            let pct = if *n <= 1.0 { n * 100.0 } else { *n };
            RateParse::Value(pct.clamp(0.0, 100.0))
        }
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return RateParse::Missing;
            }
            match t.strip_suffix('%') {
                Some(body) => match body.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => RateParse::Value(v.clamp(0.0, 100.0)),
                    _ => RateParse::Invalid(t.to_string()),
                },
                None => RateParse::Invalid(t.to_string()),
            }
        }
    }
}

pub fn mean(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Canonical display form for a month number (`3` → `"3月"`).
pub fn month_label(month: u32) -> String {
    format!("{}月", month)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators.
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
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
    // Thin wrapper for counts in console messages (e.g., `1,234 rows`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_text_and_plain_percentages_normalize() {
        assert_eq!(normalize_rate(&Cell::Number(0.85)), RateParse::Value(85.0));
        assert_eq!(
            normalize_rate(&Cell::Text("92%".into())),
            RateParse::Value(92.0)
        );
        assert_eq!(normalize_rate(&Cell::Number(92.0)), RateParse::Value(92.0));
    }

    #[test]
    fn unparsable_percent_text_is_invalid_not_zero() {
        assert_eq!(
            normalize_rate(&Cell::Text("abc%".into())),
            RateParse::Invalid("abc%".to_string())
        );
        assert_eq!(
            normalize_rate(&Cell::Text("done".into())),
            RateParse::Invalid("done".to_string())
        );
    }

    #[test]
    fn blank_cells_are_missing() {
        assert_eq!(normalize_rate(&Cell::Empty), RateParse::Missing);
        assert_eq!(normalize_rate(&Cell::Text("  ".into())), RateParse::Missing);
        assert_eq!(normalize_rate(&Cell::Number(f64::NAN)), RateParse::Missing);
    }

    #[test]
    fn percent_text_is_not_rescaled() {
        // "0.5%" means half a percent, not 50%.
        assert_eq!(
            normalize_rate(&Cell::Text("0.5%".into())),
            RateParse::Value(0.5)
        );
    }

    #[test]
    fn normalized_values_stay_within_bounds() {
        assert_eq!(
            normalize_rate(&Cell::Text("150%".into())),
            RateParse::Value(100.0)
        );
        assert_eq!(normalize_rate(&Cell::Number(-3.0)), RateParse::Value(0.0));
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[80.0, 90.0]), 85.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn month_labels() {
        assert_eq!(month_label(1), "1月");
        assert_eq!(month_label(12), "12月");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(7.0, 0), "7");
        assert_eq!(format_int(9855), "9,855");
    }
}
