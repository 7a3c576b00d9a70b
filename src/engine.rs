// The shared result object behind the query API.
//
// State machine: Empty → Loaded → Processed. `load` and `process` report
// success as booleans plus console diagnostics; no structured error ever
// crosses this surface. Any failure resets the whole object to Empty so
// partially populated state is never observable.
use crate::aggregate::{aggregate_metrics, monthly_stats};
use crate::classify::{classify_summary, department_names, ClassifierConfig};
use crate::completion::extract_completion;
use crate::loader;
use crate::types::{
    CompletionRates, MonthlyStats, ProcessedMetrics, SchemaWarning, Table,
};
use crate::util::{format_int, mean, month_label};
use chrono::{Datelike, Local};
use std::cmp::Ordering;

/// Flat rate used for the always-renderable fallback series when no
/// completion data exists anywhere.
const FALLBACK_RATE: f64 = 50.0;

#[derive(Debug, Default)]
pub struct DashboardData {
    config: ClassifierConfig,
    summary: Option<Table>,
    task_status: Option<Table>,
    year: Option<i32>,
    departments: Vec<String>,
    months: Vec<u32>,
    processed: ProcessedMetrics,
    stats: MonthlyStats,
    completion: CompletionRates,
    warnings: Vec<SchemaWarning>,
}

impl DashboardData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        DashboardData {
            config,
            ..Self::default()
        }
    }

    /// Load a workbook into the primary/secondary tables.
    ///
    /// On any failure all state resets to Empty; nothing partial is kept.
    pub fn load(&mut self, path: &str) -> bool {
        match loader::load_workbook(path) {
            Ok((primary, secondary, report)) => {
                println!(
                    "Loaded sheets {:?}: {} ({} / {} data rows)",
                    report.sheet_names,
                    report.resolution.describe(),
                    format_int(report.primary_rows),
                    format_int(report.secondary_rows)
                );
                self.install_tables(primary, secondary);
                true
            }
            Err(e) => {
                eprintln!("Error loading workbook: {}", e);
                self.reset();
                false
            }
        }
    }

    /// Install already-parsed tables, discarding every prior result.
    pub fn install_tables(&mut self, primary: Table, secondary: Table) {
        self.reset();
        self.summary = Some(primary);
        self.task_status = Some(secondary);
    }

    fn reset(&mut self) {
        *self = DashboardData {
            config: self.config.clone(),
            ..Self::default()
        };
    }

    /// Run the extraction pass over the loaded tables.
    ///
    /// Rebuilds every derived structure from scratch, so repeating the
    /// call over the same tables yields identical results. Fails (and
    /// resets to Empty) only when nothing is loaded.
    pub fn process(&mut self) -> bool {
        let Some(summary) = &self.summary else {
            println!("No summary data to process");
            self.reset();
            return false;
        };

        let mut warnings: Vec<SchemaWarning> = Vec::new();
        let layout = classify_summary(summary, &self.config, &mut warnings);
        let departments = department_names(summary, layout.dept_col);
        let processed = aggregate_metrics(summary, &layout, &departments);
        let stats = monthly_stats(&processed, &layout.months);
        let completion = match &self.task_status {
            Some(status) if !status.is_empty() => {
                extract_completion(status, &departments, &mut warnings)
            }
            _ => CompletionRates::new(),
        };

        self.departments = departments;
        self.months = layout.months;
        self.processed = processed;
        self.stats = stats;
        self.completion = completion;
        self.warnings = warnings;
        if self.year.is_none() {
            self.year = Some(Local::now().year());
        }
        true
    }

    /// Top-`n` departments by mean completion rate over their available
    /// months, each with its full per-month series ("no data" months stay
    /// `None`, never interpolated).
    ///
    /// Departments without any rate data pad the tail in discovery order.
    /// With no rate data at all, returns `n` flat 50% placeholder series
    /// as a deterministic, always-renderable default.
    pub fn get_top_departments_completion(
        &self,
        n: usize,
    ) -> (Vec<String>, Vec<Vec<Option<f64>>>, Vec<String>) {
        let month_labels: Vec<String> = self.months.iter().map(|&m| month_label(m)).collect();

        if self.completion.is_empty() {
            let names: Vec<String> = self.departments.iter().take(n).cloned().collect();
            let series = vec![vec![Some(FALLBACK_RATE); self.months.len()]; n];
            return (month_labels, series, names);
        }

        let mut ranked: Vec<(String, f64)> = Vec::new();
        for dept in &self.departments {
            let Some(by_month) = self.completion.get(dept) else {
                continue;
            };
            let available: Vec<f64> = self
                .months
                .iter()
                .filter_map(|m| by_month.get(m).copied().flatten())
                .collect();
            if !available.is_empty() {
                ranked.push((dept.clone(), mean(&available)));
            }
        }
        // Stable sort keeps discovery order between equal means.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut selected: Vec<String> = ranked.into_iter().take(n).map(|(d, _)| d).collect();
        if selected.len() < n {
            for dept in &self.departments {
                if selected.len() >= n {
                    break;
                }
                if !selected.contains(dept) {
                    selected.push(dept.clone());
                }
            }
        }

        let series: Vec<Vec<Option<f64>>> = selected
            .iter()
            .map(|dept| {
                self.months
                    .iter()
                    .map(|m| {
                        self.completion
                            .get(dept)
                            .and_then(|by_month| by_month.get(m))
                            .copied()
                            .flatten()
                    })
                    .collect()
            })
            .collect();

        (month_labels, series, selected)
    }

    /// Known months, known departments, and the full metrics projection.
    pub fn get_department_monthly_metrics(&self) -> (Vec<String>, Vec<String>, &ProcessedMetrics) {
        let month_labels: Vec<String> = self.months.iter().map(|&m| month_label(m)).collect();
        (month_labels, self.departments.clone(), &self.processed)
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn monthly_stats(&self) -> &MonthlyStats {
        &self.stats
    }

    pub fn completion_rates(&self) -> &CompletionRates {
        &self.completion
    }

    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}
