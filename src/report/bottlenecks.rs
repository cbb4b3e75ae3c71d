use super::types::{Bottleneck, BottleneckKind, EndpointResult, EndpointStatus, Severity, Summary};

/// Average response time above this is reported.
const SLOW_AVG_MS: u64 = 500;
/// Average response time above this escalates to high severity.
const VERY_SLOW_AVG_MS: u64 = 1000;
/// Overall error rate above this percentage is reported.
const HIGH_ERROR_RATE_PCT: f64 = 5.0;
/// Degraded endpoints above this error percentage are high severity.
const DEGRADED_HIGH_PCT: u64 = 10;
const PERCENT: u64 = 100;
const ALL_ENDPOINTS: &str = "Multiple endpoints";

/// Applies the fixed bottleneck heuristics to a finished run.
#[must_use]
pub fn detect_bottlenecks(
    summary: &Summary,
    endpoints: &[EndpointResult],
    virtual_users: u64,
) -> Vec<Bottleneck> {
    let mut found = Vec::new();

    if summary.avg_response_time_ms > SLOW_AVG_MS {
        found.push(Bottleneck {
            kind: BottleneckKind::HighResponseTime,
            endpoint: ALL_ENDPOINTS.to_owned(),
            description: format!(
                "Average response time of {}ms exceeds the recommended {}ms under {} concurrent users.",
                summary.avg_response_time_ms, SLOW_AVG_MS, virtual_users
            ),
            severity: if summary.avg_response_time_ms > VERY_SLOW_AVG_MS {
                Severity::High
            } else {
                Severity::Medium
            },
            metric: format!(
                "Avg: {}ms, P95: {}ms",
                summary.avg_response_time_ms, summary.p95_ms
            ),
            recommendation: "Optimize database queries, add caching, or scale horizontally"
                .to_owned(),
        });
    }

    if summary.error_rate_pct > HIGH_ERROR_RATE_PCT {
        found.push(Bottleneck {
            kind: BottleneckKind::HighErrorRate,
            endpoint: ALL_ENDPOINTS.to_owned(),
            description: format!(
                "Error rate of {}% exceeds the acceptable {}%. The server may be overwhelmed under {} concurrent users.",
                summary.error_rate_pct, HIGH_ERROR_RATE_PCT, virtual_users
            ),
            severity: Severity::High,
            metric: format!(
                "{} of {} requests failed",
                summary.failed_requests, summary.total_requests
            ),
            recommendation: "Check server logs, increase connection pool, add rate limiting"
                .to_owned(),
        });
    }

    for endpoint in endpoints
        .iter()
        .filter(|endpoint| endpoint.status == EndpointStatus::Degraded)
    {
        let high = endpoint.errors.saturating_mul(PERCENT)
            > endpoint.requests.saturating_mul(DEGRADED_HIGH_PCT);
        let error_pct = if endpoint.requests > 0 {
            endpoint.errors as f64 / endpoint.requests as f64 * 100.0
        } else {
            0.0
        };
        found.push(Bottleneck {
            kind: BottleneckKind::DegradedEndpoint,
            endpoint: endpoint.endpoint.clone(),
            description: format!(
                "{} {} has {} errors out of {} requests.",
                endpoint.method, endpoint.endpoint, endpoint.errors, endpoint.requests
            ),
            severity: if high { Severity::High } else { Severity::Medium },
            metric: format!("Error rate: {:.1}%", error_pct),
            recommendation:
                "Investigate endpoint-specific issues, check upstream dependencies".to_owned(),
        });
    }

    found
}
