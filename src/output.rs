// Presentation rows and export helpers consumed by the CLI.
//
// Everything here sits on the read-only query API; no extraction logic.
use crate::engine::DashboardData;
use crate::types::{CompletionRates, MonthlyStats, ProcessedMetrics};
use crate::util::{format_number, month_label};
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table as ConsoleTable, Tabled};

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CompletionRow {
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "CompletionRate")]
    #[tabled(rename = "CompletionRate")]
    pub rate: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricsRow {
    #[serde(rename = "Department")]
    #[tabled(rename = "Department")]
    pub department: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "CompletedTasks")]
    #[tabled(rename = "CompletedTasks")]
    pub completed_tasks: String,
    #[serde(rename = "Deliverables")]
    #[tabled(rename = "Deliverables")]
    pub deliverables: String,
    #[serde(rename = "Reviews")]
    #[tabled(rename = "Reviews")]
    pub reviews: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTotalsRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "CompletedTasks")]
    #[tabled(rename = "CompletedTasks")]
    pub completed_tasks: String,
    #[serde(rename = "Deliverables")]
    #[tabled(rename = "Deliverables")]
    pub deliverables: String,
    #[serde(rename = "Reviews")]
    #[tabled(rename = "Reviews")]
    pub reviews: String,
}

/// JSON snapshot of one processed workbook.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub year: Option<i32>,
    pub departments: Vec<String>,
    pub months: Vec<String>,
    pub metrics: ProcessedMetrics,
    pub monthly_totals: MonthlyStats,
    pub completion_rates: CompletionRates,
}

/// Long-format rows for the top-`n` completion-rate report. Months
/// without data render as "no data", never zero-filled.
pub fn completion_rows(data: &DashboardData, n: usize) -> Vec<CompletionRow> {
    let (months, series, names) = data.get_top_departments_completion(n);
    let mut rows = Vec::new();
    for (dept, rates) in names.iter().zip(&series) {
        for (month, rate) in months.iter().zip(rates) {
            rows.push(CompletionRow {
                department: dept.clone(),
                month: month.clone(),
                rate: match rate {
                    Some(v) => format!("{}%", format_number(*v, 2)),
                    None => "no data".to_string(),
                },
            });
        }
    }
    rows
}

pub fn metrics_rows(data: &DashboardData) -> Vec<MetricsRow> {
    let (_, departments, processed) = data.get_department_monthly_metrics();
    let mut rows = Vec::new();
    for dept in &departments {
        let Some(by_month) = processed.get(dept) else {
            continue;
        };
        for (&month, set) in by_month {
            rows.push(MetricsRow {
                department: dept.clone(),
                month: month_label(month),
                completed_tasks: format_number(set.completed_tasks, 0),
                deliverables: format_number(set.deliverables, 0),
                reviews: format_number(set.reviews, 0),
            });
        }
    }
    rows
}

pub fn monthly_totals_rows(stats: &MonthlyStats) -> Vec<MonthlyTotalsRow> {
    stats
        .iter()
        .map(|(&month, set)| MonthlyTotalsRow {
            month: month_label(month),
            completed_tasks: format_number(set.completed_tasks, 0),
            deliverables: format_number(set.deliverables, 0),
            reviews: format_number(set.reviews, 0),
        })
        .collect()
}

pub fn snapshot(data: &DashboardData) -> Snapshot {
    let (months, departments, processed) = data.get_department_monthly_metrics();
    Snapshot {
        year: data.year(),
        departments,
        months,
        metrics: processed.clone(),
        monthly_totals: data.monthly_stats().clone(),
        completion_rates: data.completion_rates().clone(),
    }
}

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = ConsoleTable::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
