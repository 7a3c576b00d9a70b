// Projection of the primary sheet into Department×Month×Metric values
// plus the cross-department monthly sums.
use crate::classify::SummaryLayout;
use crate::types::{Cell, MetricKind, MetricSet, MonthlyStats, ProcessedMetrics, Table};
use std::collections::BTreeMap;

/// Build `ProcessedMetrics` from the classified primary sheet.
///
/// Each department reads from its first matching row only; later rows are
/// ignored on this sheet. Missing, non-numeric, and NaN cells coerce to 0.
/// A department with no rows at all is skipped entirely, not zero-filled.
pub fn aggregate_metrics(
    table: &Table,
    layout: &SummaryLayout,
    departments: &[String],
) -> ProcessedMetrics {
    let mut processed = ProcessedMetrics::new();
    for dept in departments {
        let Some(row) = table.rows.iter().find(|row| {
            row.get(layout.dept_col)
                .and_then(Cell::as_clean_string)
                .as_deref()
                == Some(dept.as_str())
        }) else {
            continue;
        };

        let mut by_month: BTreeMap<u32, MetricSet> = BTreeMap::new();
        for (&month, binding) in &layout.bindings {
            let mut set = MetricSet::default();
            for (slot, kind) in MetricKind::ALL.iter().enumerate() {
                let value = binding.cols[slot]
                    .and_then(|col| row.get(col))
                    .and_then(Cell::as_number)
                    .unwrap_or(0.0);
                set.set(*kind, value);
            }
            by_month.insert(month, set);
        }
        processed.insert(dept.clone(), by_month);
    }
    processed
}

/// Sum each metric over all departments present for each month.
pub fn monthly_stats(processed: &ProcessedMetrics, months: &[u32]) -> MonthlyStats {
    let mut stats = MonthlyStats::new();
    for &month in months {
        let mut total = MetricSet::default();
        for by_month in processed.values() {
            if let Some(set) = by_month.get(&month) {
                for kind in MetricKind::ALL {
                    total.set(kind, total.get(kind) + set.get(kind));
                }
            }
        }
        stats.insert(month, total);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify_summary, department_names, ClassifierConfig};
    use crate::types::SchemaWarning;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn classify(table: &Table) -> (SummaryLayout, Vec<String>, Vec<SchemaWarning>) {
        let mut warnings = Vec::new();
        let layout = classify_summary(table, &ClassifierConfig::default(), &mut warnings);
        let departments = department_names(table, layout.dept_col);
        (layout, departments, warnings)
    }

    #[test]
    fn end_to_end_single_month() {
        let table = Table::new(
            vec![
                "部门".to_string(),
                "1月完成任务数".to_string(),
                "1月输出物".to_string(),
                "1月审签数".to_string(),
            ],
            vec![
                vec![text("A"), num(5.0), num(2.0), num(1.0)],
                vec![text("B"), num(3.0), num(1.0), num(0.0)],
            ],
        );
        let (layout, departments, _) = classify(&table);
        let processed = aggregate_metrics(&table, &layout, &departments);

        let a = processed.get("A").unwrap().get(&1).unwrap();
        assert_eq!((a.completed_tasks, a.deliverables, a.reviews), (5.0, 2.0, 1.0));
        let b = processed.get("B").unwrap().get(&1).unwrap();
        assert_eq!((b.completed_tasks, b.deliverables, b.reviews), (3.0, 1.0, 0.0));

        let stats = monthly_stats(&processed, &layout.months);
        let total = stats.get(&1).unwrap();
        assert_eq!(
            (total.completed_tasks, total.deliverables, total.reviews),
            (8.0, 3.0, 1.0)
        );
    }

    #[test]
    fn department_without_rows_is_absent_not_zero_filled() {
        let table = Table::new(
            vec!["部门".to_string(), "3月".to_string(), "b".to_string(), "c".to_string()],
            vec![vec![text("A"), num(2.0), num(0.0), num(0.0)]],
        );
        let (layout, _, _) = classify(&table);
        // "C" is known from elsewhere but has no rows on this sheet.
        let departments = vec!["A".to_string(), "C".to_string()];
        let processed = aggregate_metrics(&table, &layout, &departments);
        assert!(processed.contains_key("A"));
        assert!(!processed.contains_key("C"));
    }

    #[test]
    fn first_matching_row_wins_for_primary_sheet() {
        let table = Table::new(
            vec!["部门".to_string(), "2月".to_string(), "b".to_string(), "c".to_string()],
            vec![
                vec![text("A"), num(4.0), num(1.0), num(1.0)],
                vec![text("A"), num(9.0), num(9.0), num(9.0)],
            ],
        );
        let (layout, departments, _) = classify(&table);
        let processed = aggregate_metrics(&table, &layout, &departments);
        assert_eq!(processed.get("A").unwrap().get(&2).unwrap().completed_tasks, 4.0);
    }

    #[test]
    fn missing_and_textual_cells_coerce_to_zero() {
        let table = Table::new(
            vec!["部门".to_string(), "6月".to_string(), "b".to_string(), "c".to_string()],
            vec![vec![text("A"), Cell::Empty, text("n/a")]],
        );
        let (layout, departments, _) = classify(&table);
        let processed = aggregate_metrics(&table, &layout, &departments);
        let set = processed.get("A").unwrap().get(&6).unwrap();
        // Empty cell, textual cell, and the short row all read as 0.
        assert_eq!((set.completed_tasks, set.deliverables, set.reviews), (0.0, 0.0, 0.0));
    }

    #[test]
    fn every_department_covers_every_discovered_month() {
        let table = Table::new(
            vec![
                "部门".to_string(),
                "1月".to_string(),
                "b".to_string(),
                "c".to_string(),
                "2月".to_string(),
                "e".to_string(),
                "f".to_string(),
            ],
            vec![
                vec![text("A"), num(1.0), num(1.0), num(1.0)],
                vec![text("B"), num(2.0), num(2.0), num(2.0), num(3.0), num(3.0), num(3.0)],
            ],
        );
        let (layout, departments, _) = classify(&table);
        let processed = aggregate_metrics(&table, &layout, &departments);
        for dept in &departments {
            let by_month = processed.get(dept).unwrap();
            assert_eq!(by_month.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        }
    }

    #[test]
    fn monthly_sum_counts_only_present_departments() {
        let table = Table::new(
            vec!["部门".to_string(), "3月".to_string(), "b".to_string(), "c".to_string()],
            vec![
                vec![text("A"), num(2.0), num(0.0), num(0.0)],
                vec![text("B"), num(5.0), num(0.0), num(0.0)],
                vec![text("C"), num(0.0), num(0.0), num(0.0)],
            ],
        );
        let (layout, _, _) = classify(&table);
        // "D" never appears in the sheet and must contribute nothing.
        let departments: Vec<String> =
            ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let processed = aggregate_metrics(&table, &layout, &departments);
        let stats = monthly_stats(&processed, &layout.months);
        assert_eq!(stats.get(&3).unwrap().completed_tasks, 7.0);
    }
}
