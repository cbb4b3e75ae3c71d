use loadpilot::history::HistoryRecord;
use loadpilot::report::{BreakdownSource, EndpointStatus, Severity, TestResult};

pub(crate) fn summary_lines(test_id: &str, result: &TestResult) -> Vec<String> {
    let summary = &result.summary;
    let mut lines = Vec::new();
    lines.push(format!("Test: {}", test_id));
    lines.push(format!("Duration: {}s", summary.duration_secs));
    lines.push(format!("Total Requests: {}", summary.total_requests));
    lines.push(format!("Successful: {}", summary.successful_requests));
    lines.push(format!(
        "Failed: {} ({:.2}%)",
        summary.failed_requests, summary.error_rate_pct
    ));
    lines.push(format!("Avg Response Time: {}ms", summary.avg_response_time_ms));
    lines.push(format!("P95: {}ms", summary.p95_ms));
    lines.push(format!("P99: {}ms", summary.p99_ms));
    lines.push(format!("Throughput: {:.1} req/s", summary.throughput_req_per_sec));
    lines.push(format!("Peak Concurrency: {}", summary.peak_concurrency));
    if summary.samples_truncated {
        lines.push("Note: percentiles computed over a capped sample set".to_owned());
    }

    if !result.endpoints.is_empty() {
        lines.push("Endpoints:".to_owned());
        for endpoint in &result.endpoints {
            lines.push(format!(
                "  {} {} - {} reqs, avg {}ms, p95 {}ms, {} errors [{}]",
                endpoint.method,
                endpoint.endpoint,
                endpoint.requests,
                endpoint.avg_time_ms,
                endpoint.p95_time_ms,
                endpoint.errors,
                endpoint_status(endpoint.status)
            ));
        }
    }

    if !result.bottlenecks.is_empty() {
        lines.push("Bottlenecks:".to_owned());
        for bottleneck in &result.bottlenecks {
            lines.push(format!(
                "  [{}] {} ({}): {}",
                severity(bottleneck.severity),
                bottleneck.kind.label(),
                bottleneck.metric,
                bottleneck.recommendation
            ));
        }
    }

    if !result.error_breakdown.is_empty() {
        let source = match result.error_breakdown_source {
            BreakdownSource::Observed => "observed",
            BreakdownSource::Estimated => "estimated",
        };
        lines.push(format!("Errors ({}):", source));
        for entry in &result.error_breakdown {
            let code = entry
                .code
                .map_or_else(|| "-".to_owned(), |status| status.to_string());
            lines.push(format!("  {} {}: {}", code, entry.name, entry.count));
        }
    }
    lines
}

pub(crate) fn history_lines(records: &[HistoryRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No recorded test runs.".to_owned()];
    }
    records
        .iter()
        .map(|record| {
            format!(
                "{}  {}  {:<9}  {}  avg {}ms  {:.1} req/s  {:.2}% errors",
                record.id,
                record.start_time.format("%Y-%m-%d %H:%M:%S"),
                record.status.as_str(),
                record.name,
                record.result_summary.avg_time,
                record.result_summary.throughput,
                record.result_summary.error_rate
            )
        })
        .collect()
}

const fn endpoint_status(status: EndpointStatus) -> &'static str {
    match status {
        EndpointStatus::Healthy => "healthy",
        EndpointStatus::Degraded => "degraded",
    }
}

const fn severity(severity: Severity) -> &'static str {
    match severity {
        Severity::Medium => "medium",
        Severity::High => "high",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loadpilot::config::{HttpMethod, LoadTestConfig, SelectedEndpoint};
    use loadpilot::engine::SessionStatus;
    use loadpilot::metrics::MetricsAccumulator;
    use loadpilot::report::aggregate;

    fn config() -> LoadTestConfig {
        LoadTestConfig::new(
            "https://api.example.com",
            vec![SelectedEndpoint {
                method: HttpMethod::Get,
                endpoint: "/health".to_owned(),
                description: None,
                body: None,
            }],
        )
    }

    fn result_with_failures() -> TestResult {
        let mut accumulator = MetricsAccumulator::new(50, 1000);
        let lines = [
            r#"{"type":"Point","metric":"http_reqs","data":{"time":"2026-01-01T00:00:00Z","value":4,"tags":{"endpoint":"/health"}}}"#,
            r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2026-01-01T00:00:00Z","value":900,"tags":{"endpoint":"/health"}}}"#,
            r#"{"type":"Point","metric":"http_req_failed","data":{"time":"2026-01-01T00:00:02Z","value":1,"tags":{"endpoint":"/health","status":"503"}}}"#,
        ];
        accumulator.fold_lines(lines);
        aggregate(&accumulator, &config())
    }

    #[test]
    fn summary_lists_totals_endpoints_and_findings() -> Result<(), String> {
        let lines = summary_lines("lt-1", &result_with_failures());
        for expected in [
            "Test: lt-1",
            "Total Requests: 4",
            "Failed: 1 (25.00%)",
            "Avg Response Time: 900ms",
            "Throughput: 2.0 req/s",
            "  GET /health - 1 reqs, avg 900ms, p95 900ms, 1 errors [degraded]",
            "Errors (observed):",
            "  503 Service Unavailable: 1",
        ] {
            if !lines.iter().any(|line| line == expected) {
                return Err(format!("Missing {:?} in {:#?}", expected, lines));
            }
        }
        if !lines.iter().any(|line| line.starts_with("  [medium] High Response Time")) {
            return Err(format!("Missing response time finding in {:#?}", lines));
        }
        Ok(())
    }

    #[test]
    fn history_lines_render_each_record() -> Result<(), String> {
        if history_lines(&[]) != ["No recorded test runs."] {
            return Err("Empty history must say so".to_owned());
        }
        let result = result_with_failures();
        let record = HistoryRecord::new("lt-9", &config(), SessionStatus::Failed, Utc::now(), &result);
        let lines = history_lines(&[record]);
        match lines.as_slice() {
            [line] if line.starts_with("lt-9 ") && line.contains("failed") && line.contains("25.00% errors") => Ok(()),
            other => Err(format!("Unexpected lines: {:?}", other)),
        }
    }
}
