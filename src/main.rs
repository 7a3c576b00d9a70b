// Entry point and high-level CLI flow.
//
// The binary is presentation glue over the extraction engine:
// - Option [1] loads a workbook and runs the extraction pass, printing
//   diagnostics and any schema warnings.
// - Option [2] renders the completion-rate and monthly-metric reports,
//   exports them as CSV, and writes a JSON snapshot.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod aggregate;
mod classify;
mod completion;
mod engine;
mod loader;
mod output;
mod types;
mod util;

use engine::DashboardData;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

// Simple in-memory app state so we only load/process the workbook once
// but can render reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<DashboardData>> = Lazy::new(|| Mutex::new(DashboardData::new()));

const DEFAULT_WORKBOOK: &str = "dashboard_data.xlsx";
const TOP_DEPARTMENTS: usize = 4;

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the workbook and run the extraction pass.
///
/// Both calls are gating: a false return leaves the engine empty and the
/// user back at the menu.
fn handle_load() {
    print!("Workbook path [{}]: ", DEFAULT_WORKBOOK);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    let trimmed = buf.trim();
    let path = if trimmed.is_empty() {
        DEFAULT_WORKBOOK
    } else {
        trimmed
    };

    let mut data = APP_STATE.lock().unwrap();
    if !data.load(path) {
        eprintln!("Failed to load workbook.\n");
        return;
    }
    if !data.process() {
        eprintln!("Failed to process workbook data.\n");
        return;
    }
    println!(
        "Found {} departments across {} months.",
        util::format_int(data.departments().len()),
        util::format_int(data.months().len())
    );
    for warning in data.warnings() {
        println!("Warning: {}", warning);
    }
    println!("");
}

/// Handle option [2]: render all reports and the JSON snapshot.
///
/// This function is intentionally side-effectful:
/// - writes three CSV files,
/// - writes a JSON snapshot,
/// - and prints Markdown previews of each report to the console.
fn handle_generate_reports() {
    let data = APP_STATE.lock().unwrap();
    if data.departments().is_empty() {
        println!("Error: No data loaded. Please load a workbook first (option 1).\n");
        return;
    }

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let r1 = output::completion_rows(&data, TOP_DEPARTMENTS);
    let file1 = "report1_completion_rates.csv";
    if let Err(e) = output::write_csv(file1, &r1) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Department Completion Rates\n");
    println!("Department Completion Rates");
    println!("(Top {} by mean over available months)\n", TOP_DEPARTMENTS);
    output::preview_table_rows(&r1, 6);
    println!("(Full table exported to {})\n", file1);

    let r2 = output::metrics_rows(&data);
    let file2 = "report2_department_metrics.csv";
    if let Err(e) = output::write_csv(file2, &r2) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Department Monthly Metrics\n");
    println!("Department Monthly Metrics");
    println!("(Completed tasks / deliverables / reviews per month)\n");
    output::preview_table_rows(&r2, 6);
    println!("(Full table exported to {})\n", file2);

    let r3 = output::monthly_totals_rows(data.monthly_stats());
    let file3 = "report3_monthly_totals.csv";
    if let Err(e) = output::write_csv(file3, &r3) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Monthly Cross-Department Totals");
    println!("Monthly Cross-Department Totals");
    println!("(Summed over all departments)\n");
    output::preview_table_rows(&r3, 6);
    println!("(Full table exported to {})\n", file3);

    let snapshot = output::snapshot(&data);
    if let Err(e) = output::write_json("dashboard_snapshot.json", &snapshot) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Snapshot (dashboard_snapshot.json): {} departments, {} months\n",
        util::format_int(snapshot.departments.len()),
        util::format_int(snapshot.months.len())
    );
}

fn main() {
    loop {
        println!("Department Dashboard Extractor:");
        println!("[1] Load a workbook");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
