//! Final run report.
//!
//! Pure formatting of the terminal status and metrics. Reporting must
//! never fail: absent values are stated explicitly instead of raising.

use sparkjob_datamechanics::status::JobStatus;

/// Render the human-readable run report.
///
/// Contains the final state, start/end timestamps, and every metric
/// key-value pair in the order the metrics map provides them.
pub fn render_report(
    status: &JobStatus,
    metrics: Option<&serde_json::Map<String, serde_json::Value>>,
) -> String {
    let mut report = String::new();
    report.push_str(&format!("Job state: {}\n", status.state));
    report.push_str(&format!(
        "Started at: {}\n",
        status
            .started_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "not reported".into())
    ));
    report.push_str(&format!(
        "Ended at: {}\n",
        status
            .ended_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "not reported".into())
    ));

    match metrics {
        Some(metrics) if !metrics.is_empty() => {
            report.push_str("Metrics:\n");
            for (name, value) in metrics {
                report.push_str(&format!("  {name} = {}\n", render_value(value)));
            }
        }
        _ => report.push_str("No metrics reported.\n"),
    }

    report
}

/// Render a metric value without the JSON string quoting.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
