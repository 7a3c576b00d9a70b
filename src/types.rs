// Core data model: cells, tables, and the result structures exposed
// through the engine's query API.
//
// Everything here is rebuilt from scratch on each load+process cycle;
// nothing is mutated incrementally across runs.
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Text fragment that marks the department column in either sheet.
pub const DEPT_MARKER: &str = "部门";
/// Phrase that marks a planned-completion-rate column.
pub const RATE_PHRASE: &str = "计划任务完成率";
/// Header token for the combined January/February reporting period.
pub const COMBINED_PERIOD_TOKEN: &str = "1~2月";

/// A single spreadsheet cell after loading.
///
/// The exports mix numeric and textual encodings freely (e.g. `0.85`,
/// `"85%"`, blanks from merged cells), so downstream code always matches
/// on the variant instead of assuming a type per column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Trimmed display string used for identity (department matching).
    /// Blank and empty cells yield `None` so they drop out of key sets.
    pub fn as_clean_string(&self) -> Option<String> {
        match self {
            Cell::Number(n) => Some(format!("{}", n)),
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            Cell::Empty => None,
        }
    }

    /// Finite numeric value, or `None` for text/empty/NaN cells.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

/// An ordered table: headers plus rows, column order preserved from the
/// source sheet. An empty header string marks an unlabeled column (the
/// usual merged-cell artifact), which the rate-column search keys on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Table { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_row(&self) -> Option<&[Cell]> {
        self.rows.first().map(|r| r.as_slice())
    }
}

/// The fixed metric triple bound to three consecutive columns for every
/// detected month, always in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    CompletedTasks,
    Deliverables,
    Reviews,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::CompletedTasks,
        MetricKind::Deliverables,
        MetricKind::Reviews,
    ];

    /// Column label as it appears in the source exports.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::CompletedTasks => "完成任务数",
            MetricKind::Deliverables => "输出物",
            MetricKind::Reviews => "审签数",
        }
    }
}

/// Dense value set for one department/month pair. Metrics are never
/// missing here: absent or unparsable cells are coerced to 0 upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricSet {
    pub completed_tasks: f64,
    pub deliverables: f64,
    pub reviews: f64,
}

impl MetricSet {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::CompletedTasks => self.completed_tasks,
            MetricKind::Deliverables => self.deliverables,
            MetricKind::Reviews => self.reviews,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: f64) {
        match kind {
            MetricKind::CompletedTasks => self.completed_tasks = value,
            MetricKind::Deliverables => self.deliverables = value,
            MetricKind::Reviews => self.reviews = value,
        }
    }
}

/// Department → Month → metric values from the primary sheet.
pub type ProcessedMetrics = HashMap<String, BTreeMap<u32, MetricSet>>;

/// Month → cross-department metric sums.
pub type MonthlyStats = BTreeMap<u32, MetricSet>;

/// Department → Month → completion percentage in [0, 100]. `None` is the
/// "no data" sentinel, deliberately distinct from a computed 0%.
pub type CompletionRates = HashMap<String, BTreeMap<u32, Option<f64>>>;

/// Schema anomalies found while classifying columns. The documented
/// fallbacks (default-to-0, drop-the-value) still apply; these make the
/// detection auditable.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaWarning {
    /// A month header sat too close to the sheet edge for a full metric
    /// triple; the missing metrics read as 0.
    TruncatedMetricTriple { month: u32, available: usize },
    /// Two headers matched the same month number.
    DuplicateMonthHeader {
        month: u32,
        kept_col: usize,
        dropped_col: usize,
    },
    /// A positionally-bound metric column carries a header that names
    /// neither the expected metric nor nothing at all; the column is
    /// still read, but the export may have reordered columns.
    MetricHeaderMismatch {
        month: u32,
        column: usize,
        expected: &'static str,
    },
    /// A rate cell held text that could not be parsed as a percentage.
    UnparsableRate {
        column: usize,
        row: usize,
        raw: String,
    },
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::TruncatedMetricTriple { month, available } => write!(
                f,
                "month {} has only {} of 3 metric columns; missing metrics read as 0",
                month, available
            ),
            SchemaWarning::DuplicateMonthHeader {
                month,
                kept_col,
                dropped_col,
            } => write!(
                f,
                "month {} matched by two headers (columns {} and {}); kept column {}",
                month, dropped_col, kept_col, kept_col
            ),
            SchemaWarning::MetricHeaderMismatch {
                month,
                column,
                expected,
            } => write!(
                f,
                "column {} bound to {} for month {} has an unexpected header; check column order",
                column, expected, month
            ),
            SchemaWarning::UnparsableRate { column, row, raw } => write!(
                f,
                "could not parse rate value '{}' at row {}, column {}; value dropped",
                raw, row, column
            ),
        }
    }
}
