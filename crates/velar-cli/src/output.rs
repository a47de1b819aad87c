//! Terminal summary output.

use console::style;
use velar::{RunReport, TestStatus};

/// Print the per-case outcomes and the run summary
pub fn print_report(report: &RunReport) {
    println!();
    for case in &report.cases {
        let label = match case.status {
            TestStatus::Pass => style("PASS").green().bold(),
            TestStatus::Fail => style("FAIL").red().bold(),
            TestStatus::Skip => style("SKIP").yellow().bold(),
        };
        println!(
            "  {label}  {} ({} ms)",
            case.name,
            case.duration.as_millis()
        );
        if let Some(error) = &case.error {
            println!("        {}", style(error).red());
        }
    }
    println!();
    let summary = report.summary();
    if report.all_passed() {
        println!("{}", style(summary).green());
    } else {
        println!("{}", style(summary).red());
    }
}
