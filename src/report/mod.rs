//! Final result aggregation: summary statistics, per-endpoint results,
//! bottleneck heuristics and the error breakdown.
mod bottlenecks;
mod breakdown;
mod types;


use crate::config::{LoadTestConfig, SelectedEndpoint};
use crate::metrics::{
    EndpointBucket, MetricsAccumulator, compute_percentiles, error_rate_pct, mean, throughput,
    whole_ms,
};

pub use bottlenecks::detect_bottlenecks;
pub use breakdown::error_breakdown;
pub use types::{
    Bottleneck, BottleneckKind, BreakdownSource, EndpointResult, EndpointStatus,
    ErrorBreakdownEntry, Severity, Summary, TestResult,
};

/// An endpoint is degraded when errors exceed this share of its requests.
const DEGRADED_ERROR_PCT: u64 = 5;
const PERCENT: u64 = 100;

/// Builds the final report from everything the accumulator holds.
///
/// The endpoint list has exactly one entry per configured endpoint, in
/// configuration order, whether or not it saw traffic.
#[must_use]
pub fn aggregate(accumulator: &MetricsAccumulator, config: &LoadTestConfig) -> TestResult {
    let total_requests = accumulator.request_count();
    let failed_requests = accumulator.failed_count();
    let (p95_ms, p99_ms) = compute_percentiles(accumulator.samples());
    let duration_secs = accumulator
        .elapsed_secs()
        .unwrap_or(config.duration_secs);
    let peak_concurrency = match accumulator.peak_concurrency() {
        0 => config.virtual_users,
        observed => observed,
    };

    let summary = Summary {
        total_requests,
        successful_requests: total_requests.saturating_sub(failed_requests),
        failed_requests,
        avg_response_time_ms: whole_ms(accumulator.mean_duration_ms()),
        p95_ms,
        p99_ms,
        throughput_req_per_sec: throughput(total_requests, duration_secs),
        error_rate_pct: error_rate_pct(failed_requests, total_requests),
        peak_concurrency,
        duration_secs,
        samples_truncated: accumulator.samples_truncated(),
    };

    let endpoints: Vec<EndpointResult> = config
        .endpoints
        .iter()
        .map(|endpoint| endpoint_result(endpoint, accumulator, &summary, config.endpoints.len()))
        .collect();
    let bottlenecks = detect_bottlenecks(&summary, &endpoints, config.virtual_users);
    let (error_breakdown, error_breakdown_source) =
        error_breakdown(failed_requests, accumulator.failure_statuses());

    TestResult {
        summary,
        timeline: accumulator.timeline().to_vec(),
        endpoints,
        bottlenecks,
        error_breakdown,
        error_breakdown_source,
    }
}

fn endpoint_result(
    endpoint: &SelectedEndpoint,
    accumulator: &MetricsAccumulator,
    summary: &Summary,
    endpoint_count: usize,
) -> EndpointResult {
    let empty = EndpointBucket::default();
    let bucket = accumulator
        .per_endpoint()
        .get(&endpoint.endpoint)
        .unwrap_or(&empty);

    let even_share = u64::try_from(endpoint_count)
        .ok()
        .and_then(|count| summary.total_requests.checked_div(count))
        .unwrap_or(0);
    let (avg_time_ms, p95_time_ms) = if bucket.times.is_empty() {
        (summary.avg_response_time_ms, summary.p95_ms)
    } else {
        (
            whole_ms(mean(bucket.times.iter().copied(), bucket.times.len())),
            compute_percentiles(&bucket.times).0,
        )
    };
    let degraded = bucket.errors.saturating_mul(PERCENT)
        > bucket.requests.saturating_mul(DEGRADED_ERROR_PCT);

    EndpointResult {
        method: endpoint.method,
        endpoint: endpoint.endpoint.clone(),
        description: endpoint.description.clone(),
        requests: if bucket.requests > 0 {
            bucket.requests
        } else {
            even_share
        },
        avg_time_ms,
        p95_time_ms,
        errors: bucket.errors,
        status: if degraded {
            EndpointStatus::Degraded
        } else {
            EndpointStatus::Healthy
        },
    }
}
