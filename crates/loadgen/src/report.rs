//! Results reporting and formatting.

use crate::summary::Summary;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

/// Formats a run summary for output.
pub struct ResultsReport;

impl ResultsReport {
    /// Single summary line, average response time in seconds.
    pub fn format_line(summary: &Summary) -> String {
        format!(
            "Users: {}, Requests: {}, Success: {}, Fail: {}, Avg Response: {:.3}s",
            summary.users,
            summary.total_requests,
            summary.successes,
            summary.failures,
            summary.average_latency.as_secs_f64()
        )
    }

    /// Format results as a console table.
    pub fn format_table(summary: &Summary) -> String {
        let mut table = Table::new();
        let title = if summary.cancelled {
            "Load Test Results (interrupted)"
        } else {
            "Load Test Results"
        };
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![title, ""]);

        table.add_row(vec!["Users:", &summary.users.to_string()]);
        table.add_row(vec!["Duration:", &format!("{:.2}s", summary.elapsed.as_secs_f64())]);
        table.add_row(vec!["Total Requests:", &summary.total_requests.to_string()]);
        table.add_row(vec!["Success:", &summary.successes.to_string()]);
        table.add_row(vec!["Fail:", &summary.failures.to_string()]);
        table.add_row(vec!["Success Rate:", &format!("{:.1}%", summary.success_rate())]);
        table.add_row(vec![
            "Requests/sec:",
            &format!("{:.1}", summary.requests_per_second),
        ]);
        table.add_row(vec![
            "Avg Response:",
            &format!("{:.3}s", summary.average_latency.as_secs_f64()),
        ]);

        table.add_row(vec!["", ""]);
        table.add_row(vec!["Latency (ms)", "min / p50 / p90 / p99 / max"]);
        table.add_row(vec![
            "",
            &format!(
                "{:.1} / {:.1} / {:.1} / {:.1} / {:.1}",
                summary.latency.min_ms,
                summary.latency.p50_ms,
                summary.latency.p90_ms,
                summary.latency.p99_ms,
                summary.latency.max_ms
            ),
        ]);

        if !summary.status_counts.is_empty() {
            table.add_row(vec!["", ""]);
            table.add_row(vec!["Status", "Count"]);
            for (status, count) in &summary.status_counts {
                table.add_row(vec![status.as_str(), &count.to_string()]);
            }
        }

        table.to_string()
    }

    /// Format results as JSON.
    pub fn format_json(summary: &Summary) -> serde_json::Result<String> {
        serde_json::to_string_pretty(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{FailureKind, Outcome};
    use std::time::Duration;

    fn sample() -> Summary {
        let mut outcomes = vec![Outcome::success(200, Duration::from_millis(124)); 48];
        outcomes.push(Outcome::success(503, Duration::from_millis(124)));
        outcomes.push(Outcome::success(503, Duration::from_millis(124)));
        Summary::from_outcomes(10, outcomes, Duration::from_secs(2), false)
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            ResultsReport::format_line(&sample()),
            "Users: 10, Requests: 50, Success: 48, Fail: 2, Avg Response: 0.124s"
        );
    }

    #[test]
    fn test_format_line_empty_run() {
        let summary = Summary::from_outcomes(5, Vec::new(), Duration::ZERO, false);
        assert_eq!(
            ResultsReport::format_line(&summary),
            "Users: 5, Requests: 0, Success: 0, Fail: 0, Avg Response: 0.000s"
        );
    }

    #[test]
    fn test_format_table_lists_statuses() {
        let mut outcomes = vec![Outcome::success(200, Duration::from_millis(3))];
        outcomes.push(Outcome::failure(FailureKind::Timeout));
        let summary = Summary::from_outcomes(1, outcomes, Duration::from_millis(10), true);

        let table = ResultsReport::format_table(&summary);
        assert!(table.contains("interrupted"));
        assert!(table.contains("TIMEOUT"));
        assert!(table.contains("50.0%"));
    }

    #[test]
    fn test_format_json_roundtrips_counts() {
        let json = ResultsReport::format_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_requests"], 50);
        assert_eq!(value["failures"], 2);
        assert_eq!(value["status_counts"]["503"], 2);
    }
}
