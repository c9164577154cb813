//! End-of-run summary rendering

use crate::crawler::RunSummary;
use std::fmt::Write;

/// Renders a run summary as a plain-text table
pub fn render_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let width = summary
        .reports
        .iter()
        .map(|r| r.category.len())
        .max()
        .unwrap_or(0)
        .max("Category".len());

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Harvest Summary ===\n");
    let _ = writeln!(
        out,
        "{:<width$}  {:>9}  {:>10}  Stop",
        "Category",
        "Collected",
        "Iterations",
        width = width
    );
    for report in &summary.reports {
        let _ = writeln!(
            out,
            "{:<width$}  {:>9}  {:>10}  {}",
            report.category,
            format!("{}/{}", report.collected, report.quota),
            report.iterations,
            report.stop,
            width = width
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "New assets this run: {}", summary.total_collected());
    let _ = writeln!(
        out,
        "Known references: {} ({} distinct assets)",
        summary.seen_references, summary.seen_identities
    );
    let _ = writeln!(out, "Elapsed: {}s", summary.elapsed.as_secs());

    let abandoned: Vec<&str> = summary.abandoned().map(|r| r.category.as_str()).collect();
    if !abandoned.is_empty() {
        let _ = writeln!(out, "Abandoned: {}", abandoned.join(", "));
    }

    out
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    print!("{}", render_run_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CategoryReport;
    use crate::state::StopReason;
    use std::time::Duration;

    #[test]
    fn test_render_run_summary() {
        let summary = RunSummary {
            reports: vec![
                CategoryReport {
                    category: "anime".to_string(),
                    quota: 50,
                    collected: 50,
                    iterations: 9,
                    stop: StopReason::QuotaReached,
                },
                CategoryReport {
                    category: "gaming".to_string(),
                    quota: 50,
                    collected: 0,
                    iterations: 0,
                    stop: StopReason::LoadFailed,
                },
            ],
            elapsed: Duration::from_secs(95),
            seen_references: 120,
            seen_identities: 118,
        };

        let text = render_run_summary(&summary);

        assert!(text.contains("50/50"));
        assert!(text.contains("quota_reached"));
        assert!(text.contains("load_failed"));
        assert!(text.contains("New assets this run: 50"));
        assert!(text.contains("Abandoned: gaming"));
        assert!(text.contains("Elapsed: 95s"));
    }
}
