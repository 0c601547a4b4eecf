//! Drain statistics formatting
//!
//! Turns a [`DrainReport`] into the human-readable summary the CLI prints.

use crate::crawler::DrainReport;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

/// Failure count per error kind, for the summary's error section
pub fn error_breakdown(report: &DrainReport) -> BTreeMap<&'static str, usize> {
    use crate::crawler::FetchError;

    let mut counts = BTreeMap::new();
    for error in &report.errors {
        let kind = match error {
            FetchError::Target { .. } => "invalid target",
            FetchError::Open { .. } => "open failed",
            FetchError::Transport { .. } => "transport error",
            FetchError::Aborted { .. } => "aborted",
        };
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

/// Renders the end-of-run summary
pub fn format_report(report: &DrainReport, elapsed: Duration) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "=== Drain Summary ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Dispatched: {}", report.dispatched);
    let _ = writeln!(out, "  Completed: {}", report.completed);
    let _ = writeln!(out, "  Failed: {}", report.failed);
    let _ = writeln!(out, "  Elapsed: {:.2}s", elapsed.as_secs_f64());
    let _ = writeln!(out);

    if !report.errors.is_empty() {
        let _ = writeln!(out, "Error Summary:");
        for (kind, count) in error_breakdown(report) {
            let _ = writeln!(out, "  {}: {}", kind, count);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Failed Targets ({}):", report.errors.len());
        for error in &report.errors {
            let _ = writeln!(out, "  - {}", error);
        }
        let _ = writeln!(out);
    }

    let success_rate = if report.dispatched > 0 {
        (report.completed as f64 / report.dispatched as f64) * 100.0
    } else {
        0.0
    };
    let _ = write!(
        out,
        "Success Rate: {:.1}% ({} / {} pages completed)",
        success_rate, report.completed, report.dispatched
    );

    out
}

/// Prints the summary to stdout
pub fn print_report(report: &DrainReport, elapsed: Duration) {
    println!("{}", format_report(report, elapsed));
}
