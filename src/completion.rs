// Completion-rate recovery from the secondary (task-status) sheet.
//
// The sheet classifies its own department column; the department set
// itself still comes from the primary sheet. Unlike the primary sheet,
// every row a department owns contributes here: the final rate is the
// arithmetic mean of all its non-missing normalized values. Months 1 and
// 2 share one combined reporting column; months 3–12 are located
// independently.
use crate::classify::{department_column, find_rate_column};
use crate::types::{Cell, CompletionRates, SchemaWarning, Table, COMBINED_PERIOD_TOKEN};
use crate::util::{mean, month_label, normalize_rate, RateParse};
use std::collections::BTreeMap;

/// Extract per-department monthly completion rates.
///
/// Every department×month pair starts as "no data"; only located rate
/// columns with at least one valid value fill anything in. When nothing
/// at all is found the returned structure is entirely empty, which is a
/// valid terminal state rather than an error.
pub fn extract_completion(
    table: &Table,
    departments: &[String],
    warnings: &mut Vec<SchemaWarning>,
) -> CompletionRates {
    let dept_col = department_column(&table.headers);
    let first_row = table.first_row();

    let mut rates: CompletionRates = departments
        .iter()
        .map(|dept| {
            let by_month: BTreeMap<u32, Option<f64>> = (1..=12).map(|m| (m, None)).collect();
            (dept.clone(), by_month)
        })
        .collect();

    // Months 1 and 2 share a single combined-period rate column.
    let combined_rate_col = table
        .headers
        .iter()
        .position(|h| h.contains(COMBINED_PERIOD_TOKEN))
        .and_then(|idx| find_rate_column(&table.headers, first_row, idx));
    if let Some(col) = combined_rate_col {
        for dept in departments {
            if let Some(avg) = department_mean(table, dept_col, dept, col, warnings) {
                if let Some(by_month) = rates.get_mut(dept) {
                    by_month.insert(1, Some(avg));
                    by_month.insert(2, Some(avg));
                }
            }
        }
    }

    // Months 3–12 are located independently, each with the same
    // rightward rate-column search from its own month header.
    for month in 3..=12u32 {
        let label = month_label(month);
        let Some(idx) = table.headers.iter().position(|h| h.contains(&label)) else {
            continue;
        };
        let Some(col) = find_rate_column(&table.headers, first_row, idx) else {
            continue;
        };
        for dept in departments {
            if let Some(avg) = department_mean(table, dept_col, dept, col, warnings) {
                if let Some(by_month) = rates.get_mut(dept) {
                    by_month.insert(month, Some(avg));
                }
            }
        }
    }

    let any_data = rates
        .values()
        .any(|by_month| by_month.values().any(Option::is_some));
    if any_data {
        rates
    } else {
        CompletionRates::new()
    }
}

/// Mean of a department's non-missing normalized values in one column.
/// Unparsable text drops the single value with a warning, never the pass.
fn department_mean(
    table: &Table,
    dept_col: usize,
    dept: &str,
    col: usize,
    warnings: &mut Vec<SchemaWarning>,
) -> Option<f64> {
    let mut values: Vec<f64> = Vec::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let owner = row.get(dept_col).and_then(Cell::as_clean_string);
        if owner.as_deref() != Some(dept) {
            continue;
        }
        match normalize_rate(row.get(col).unwrap_or(&Cell::Empty)) {
            RateParse::Value(v) => values.push(v),
            RateParse::Missing => {}
            RateParse::Invalid(raw) => warnings.push(SchemaWarning::UnparsableRate {
                column: col,
                row: row_idx,
                raw,
            }),
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(mean(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn depts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn combined_period_mean_fills_both_january_and_february() {
        let table = Table::new(
            headers(&["部门", "1~2月任务统计", "计划任务完成率"]),
            vec![
                vec![text("A"), text("x"), num(80.0)],
                vec![text("A"), text("y"), num(90.0)],
            ],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        let a = rates.get("A").unwrap();
        assert_eq!(a.get(&1).copied().flatten(), Some(85.0));
        assert_eq!(a.get(&2).copied().flatten(), Some(85.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn later_months_fill_independently() {
        let table = Table::new(
            headers(&["部门", "3月任务统计", "计划任务完成率", "4月任务统计", "计划任务完成率4"]),
            vec![vec![text("A"), text("x"), num(0.6), text("y"), text("75%")]],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        let a = rates.get("A").unwrap();
        assert_eq!(a.get(&3).copied().flatten(), Some(60.0));
        assert_eq!(a.get(&4).copied().flatten(), Some(75.0));
        // No combined column: January and February stay "no data".
        assert_eq!(a.get(&1).copied().flatten(), None);
        assert_eq!(a.get(&2).copied().flatten(), None);
    }

    #[test]
    fn month_without_rate_column_stays_no_data() {
        let table = Table::new(
            headers(&["部门", "5月任务统计", "完成", "未完成"]),
            vec![vec![text("A"), text("x"), num(3.0), num(1.0)]],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        // No located rate column anywhere → entirely empty structure.
        assert!(rates.is_empty());
    }

    #[test]
    fn unlabeled_rate_header_recovered_from_first_row() {
        let table = Table::new(
            headers(&["部门", "3月任务统计", ""]),
            vec![
                vec![text("A"), text("x"), text("计划任务完成率")],
                vec![text("A"), text("y"), text("88%")],
            ],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        // The marker row's own cell is unparsable text and is dropped.
        assert_eq!(
            rates.get("A").unwrap().get(&3).copied().flatten(),
            Some(88.0)
        );
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            SchemaWarning::UnparsableRate { raw, .. } if raw == "计划任务完成率"
        ));
    }

    #[test]
    fn unparsable_text_dropped_from_the_average() {
        let table = Table::new(
            headers(&["部门", "3月任务统计", "计划任务完成率"]),
            vec![
                vec![text("A"), text("x"), text("abc%")],
                vec![text("A"), text("y"), num(70.0)],
            ],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        assert_eq!(
            rates.get("A").unwrap().get(&3).copied().flatten(),
            Some(70.0)
        );
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn department_without_valid_values_stays_no_data() {
        let table = Table::new(
            headers(&["部门", "3月任务统计", "计划任务完成率"]),
            vec![
                vec![text("A"), text("x"), num(0.5)],
                vec![text("B"), text("y"), Cell::Empty],
            ],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A", "B"]), &mut warnings);
        assert_eq!(
            rates.get("A").unwrap().get(&3).copied().flatten(),
            Some(50.0)
        );
        assert_eq!(rates.get("B").unwrap().get(&3).copied().flatten(), None);
        // "B" still has its full 12-month no-data series.
        assert_eq!(rates.get("B").unwrap().len(), 12);
    }

    #[test]
    fn all_no_data_collapses_to_empty_structure() {
        let table = Table::new(
            headers(&["部门", "备注"]),
            vec![vec![text("A"), text("x")]],
        );
        let mut warnings = Vec::new();
        let rates = extract_completion(&table, &depts(&["A"]), &mut warnings);
        assert!(rates.is_empty());
    }
}
