// Workbook loading and sheet resolution.
//
// The source exports are loosely formatted: sheet names drift between
// files and merged header cells arrive as blanks. This module only gets
// two logical tables out of the workbook; all interpretation of their
// columns happens downstream.
use crate::types::{Cell, Table};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::error::Error;

/// Preferred sheet names; positional fallback applies when absent.
pub const PRIMARY_SHEET: &str = "Summary";
pub const SECONDARY_SHEET: &str = "TaskStatus";

/// Which rule of the fallback chain bound the two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetResolution {
    /// Both preferred sheet names were present.
    NamedPair,
    /// First sheet as primary, second as secondary.
    PositionalPair,
    /// Only one sheet; secondary left empty.
    SingleSheet,
}

impl SheetResolution {
    pub fn describe(self) -> &'static str {
        match self {
            SheetResolution::NamedPair => "matched sheets by name",
            SheetResolution::PositionalPair => "fell back to first two sheets by position",
            SheetResolution::SingleSheet => "single sheet only; no task-status data",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub sheet_names: Vec<String>,
    pub resolution: SheetResolution,
    pub primary_rows: usize,
    pub secondary_rows: usize,
}

/// Read a workbook into primary/secondary tables.
///
/// Resolution order: literal "Summary"/"TaskStatus" pair, then the first
/// two sheets by position, then a lone sheet with an empty secondary.
/// Zero sheets or an unreadable file is an error; the caller resets all
/// state in that case.
pub fn load_workbook(path: &str) -> Result<(Table, Table, LoadReport), Box<dyn Error>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let has_named_pair = sheet_names.iter().any(|n| n == PRIMARY_SHEET)
        && sheet_names.iter().any(|n| n == SECONDARY_SHEET);

    let (primary_name, secondary_name, resolution) = if has_named_pair {
        (
            PRIMARY_SHEET.to_string(),
            Some(SECONDARY_SHEET.to_string()),
            SheetResolution::NamedPair,
        )
    } else if sheet_names.len() >= 2 {
        (
            sheet_names[0].clone(),
            Some(sheet_names[1].clone()),
            SheetResolution::PositionalPair,
        )
    } else if sheet_names.len() == 1 {
        (sheet_names[0].clone(), None, SheetResolution::SingleSheet)
    } else {
        return Err("workbook contains no sheets".into());
    };

    let primary = table_from_range(&workbook.worksheet_range(&primary_name)?);
    let secondary = match &secondary_name {
        Some(name) => table_from_range(&workbook.worksheet_range(name)?),
        None => Table::default(),
    };

    let report = LoadReport {
        sheet_names,
        resolution,
        primary_rows: primary.rows.len(),
        secondary_rows: secondary.rows.len(),
    };
    Ok((primary, secondary, report))
}

/// First row becomes the header row; blank header cells become `""`,
/// the unlabeled marker the merged-cell recovery relies on.
fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Table::default(),
    };
    let body = rows
        .map(|row| row.iter().map(cell_from).collect())
        .collect();
    Table::new(headers, body)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_from(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
