// Column classification for the loosely-formatted exports.
//
// Nothing about the input schema is guaranteed: column order, naming and
// merged-cell layout all vary between exports. Everything in this module
// is a heuristic over header text, kept as pure functions so each one can
// be exercised against synthetic layouts.
use crate::types::{Cell, MetricKind, SchemaWarning, Table, DEPT_MARKER, RATE_PHRASE};
use std::collections::BTreeMap;

/// How far right of a month header the rate-column search may wander,
/// inclusive of the header column itself.
pub const RATE_SEARCH_WINDOW: usize = 6;

/// Policy for two headers matching the same month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateMonthPolicy {
    FirstWins,
    /// Source behavior: the later header silently replaced the earlier
    /// binding. Kept as the default, but now audited via a warning.
    #[default]
    LastWins,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    pub duplicate_month: DuplicateMonthPolicy,
}

/// Three positional columns bound to the metric triple for one month.
/// A `None` slot means the sheet ran out of columns; aggregation reads
/// those metrics as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBinding {
    pub cols: [Option<usize>; 3],
}

/// Classified layout of the primary sheet.
#[derive(Debug, Clone, Default)]
pub struct SummaryLayout {
    pub dept_col: usize,
    /// Matched month numbers, ascending, independent of header order.
    pub months: Vec<u32>,
    pub bindings: BTreeMap<u32, MetricBinding>,
}

/// First header containing the department marker; column 0 if none does.
pub fn department_column(headers: &[String]) -> usize {
    headers
        .iter()
        .position(|h| h.contains(DEPT_MARKER))
        .unwrap_or(0)
}

/// Distinct department names in first-seen order, missing cells dropped.
pub fn department_names(table: &Table, dept_col: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in &table.rows {
        if let Some(name) = row.get(dept_col).and_then(Cell::as_clean_string) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
    }
    seen
}

/// First `<digits>月` run in a header, bounded to a real month (1–12).
pub fn month_in_header(header: &str) -> Option<u32> {
    let chars: Vec<char> = header.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c != '月' {
            continue;
        }
        let mut start = i;
        while start > 0 && chars[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start == i {
            continue;
        }
        let digits: String = chars[start..i].iter().collect();
        if let Ok(month) = digits.parse::<u32>() {
            if (1..=12).contains(&month) {
                return Some(month);
            }
        }
    }
    None
}

/// Classify the primary sheet: department column plus a metric-triple
/// binding for every month header found.
pub fn classify_summary(
    table: &Table,
    config: &ClassifierConfig,
    warnings: &mut Vec<SchemaWarning>,
) -> SummaryLayout {
    let dept_col = department_column(&table.headers);
    let column_count = table.headers.len();
    let mut bindings: BTreeMap<u32, MetricBinding> = BTreeMap::new();

    for (idx, header) in table.headers.iter().enumerate() {
        let Some(month) = month_in_header(header) else {
            continue;
        };
        // The matched column and its next two positional neighbors carry
        // the fixed metric order; neighbors past the edge stay unbound.
        let cols = [
            Some(idx),
            (idx + 1 < column_count).then_some(idx + 1),
            (idx + 2 < column_count).then_some(idx + 2),
        ];
        let available = cols.iter().flatten().count();

        let kept = match bindings.get(&month) {
            None => {
                if available < 3 {
                    warnings.push(SchemaWarning::TruncatedMetricTriple { month, available });
                }
                bindings.insert(month, MetricBinding { cols });
                true
            }
            Some(existing) => {
                // A truncated re-match never displaces an existing
                // binding: per-metric headers repeat the month string
                // near the sheet edge (e.g. a trailing 1月审签数 column)
                // and are a layout artifact, not a real duplicate.
                if available < 3 {
                    false
                } else {
                    let earlier = existing.cols[0].unwrap_or(0);
                    match config.duplicate_month {
                        DuplicateMonthPolicy::LastWins => {
                            warnings.push(SchemaWarning::DuplicateMonthHeader {
                                month,
                                kept_col: idx,
                                dropped_col: earlier,
                            });
                            bindings.insert(month, MetricBinding { cols });
                            true
                        }
                        DuplicateMonthPolicy::FirstWins => {
                            warnings.push(SchemaWarning::DuplicateMonthHeader {
                                month,
                                kept_col: earlier,
                                dropped_col: idx,
                            });
                            false
                        }
                    }
                }
            }
        };

        // Positional binding is fragile against reordered exports, so the
        // neighbor headers of a kept binding are validated against the
        // expected metric labels. An unlabeled neighbor (merged-cell
        // artifact) is normal and passes.
        if kept {
            for (slot, kind) in MetricKind::ALL.iter().enumerate().skip(1) {
                if let Some(col) = cols[slot] {
                    let neighbor = &table.headers[col];
                    if !neighbor.is_empty() && !neighbor.contains(kind.label()) {
                        warnings.push(SchemaWarning::MetricHeaderMismatch {
                            month,
                            column: col,
                            expected: kind.label(),
                        });
                    }
                }
            }
        }
    }

    let months: Vec<u32> = bindings.keys().copied().collect();
    SummaryLayout {
        dept_col,
        months,
        bindings,
    }
}

/// Locate the completion-rate column for a month header at `start`.
///
/// Searches `start..start + RATE_SEARCH_WINDOW`: a header containing the
/// rate phrase wins outright; an unlabeled header (merged-cell artifact)
/// is accepted when the first data row carries the phrase instead.
pub fn find_rate_column(
    headers: &[String],
    first_row: Option<&[Cell]>,
    start: usize,
) -> Option<usize> {
    let end = (start + RATE_SEARCH_WINDOW).min(headers.len());
    for i in start..end {
        if headers[i].contains(RATE_PHRASE) {
            return Some(i);
        }
        if headers[i].is_empty() {
            if let Some(Cell::Text(s)) = first_row.and_then(|row| row.get(i)) {
                if s.contains(RATE_PHRASE) {
                    return Some(i);
                }
            }
        }
    }
    None
}
