use serde::{Deserialize, Serialize};

use crate::config::HttpMethod;
use crate::metrics::TimelinePoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub throughput_req_per_sec: f64,
    pub error_rate_pct: f64,
    pub peak_concurrency: u64,
    pub duration_secs: u64,
    /// Percentiles were computed over a capped sample list.
    #[serde(default)]
    pub samples_truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResult {
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requests: u64,
    pub avg_time_ms: u64,
    pub p95_time_ms: u64,
    pub errors: u64,
    pub status: EndpointStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BottleneckKind {
    HighResponseTime,
    HighErrorRate,
    DegradedEndpoint,
}

impl BottleneckKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            BottleneckKind::HighResponseTime => "High Response Time",
            BottleneckKind::HighErrorRate => "High Error Rate",
            BottleneckKind::DegradedEndpoint => "Degraded Endpoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub endpoint: String,
    pub description: String,
    pub severity: Severity,
    pub metric: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBreakdownEntry {
    /// `None` for failures the stream reported without a status tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub name: String,
    pub count: u64,
    pub description: String,
}

/// Where the error breakdown counts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownSource {
    /// Status tags on failed requests in the engine stream.
    Observed,
    /// Fixed proportional split of the failure count.
    Estimated,
}

/// Final report for one test. Computed once at the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub summary: Summary,
    pub timeline: Vec<TimelinePoint>,
    pub endpoints: Vec<EndpointResult>,
    pub bottlenecks: Vec<Bottleneck>,
    pub error_breakdown: Vec<ErrorBreakdownEntry>,
    pub error_breakdown_source: BreakdownSource,
}
