use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::script::ENDPOINT_TAG;

const POINT_TYPE: &str = "Point";
const STATUS_TAG: &str = "status";

/// Engine metrics the pipeline folds. Everything else in the stream is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// `http_req_duration`: one response-time sample in milliseconds.
    RequestDuration,
    /// `http_reqs`: request counter increment.
    Requests,
    /// `http_req_failed`: 1 for a failed request, 0 otherwise.
    RequestFailed,
    /// `vus`: current virtual-user gauge.
    Concurrency,
}

impl MetricKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "http_req_duration" => Some(MetricKind::RequestDuration),
            "http_reqs" => Some(MetricKind::Requests),
            "http_req_failed" => Some(MetricKind::RequestFailed),
            "vus" => Some(MetricKind::Concurrency),
            _ => None,
        }
    }
}

/// One recognized sample from the engine's JSON lines output.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub kind: MetricKind,
    pub value: f64,
    pub endpoint: Option<String>,
    pub status: Option<u16>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    metric: String,
    #[serde(default)]
    data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    tags: Option<BTreeMap<String, serde_json::Value>>,
}

/// Parses one line of engine output.
///
/// Returns `None` for anything that is not a recognized `Point` sample:
/// plain-text status lines, `Metric` declarations, unknown metrics or
/// malformed JSON. A bad line never affects its neighbours.
#[must_use]
pub fn parse_metric_line(line: &str) -> Option<MetricPoint> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let raw: RawLine = serde_json::from_str(trimmed).ok()?;
    if raw.kind != POINT_TYPE {
        return None;
    }
    let kind = MetricKind::from_name(&raw.metric)?;
    let data = raw.data?;
    let value = data.value.filter(|value| value.is_finite())?;
    let tags = data.tags.unwrap_or_default();

    Some(MetricPoint {
        kind,
        value,
        endpoint: tags.get(ENDPOINT_TAG).and_then(tag_string),
        status: tags.get(STATUS_TAG).and_then(tag_status),
        time: data
            .time
            .as_deref()
            .and_then(|time| DateTime::parse_from_rfc3339(time).ok())
            .map(|time| time.with_timezone(&Utc)),
    })
}

fn tag_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
        serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::Number(_)
        | serde_json::Value::String(_)
        | serde_json::Value::Array(_)
        | serde_json::Value::Object(_) => None,
    }
}

fn tag_status(value: &serde_json::Value) -> Option<u16> {
    match value {
        serde_json::Value::String(text) => text.trim().parse().ok(),
        serde_json::Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::Array(_)
        | serde_json::Value::Object(_) => None,
    }
}

/// Periodic live view of a running test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub elapsed_secs: u64,
    /// Mean of the most recent response-time samples, whole milliseconds.
    pub avg_response_time_ms: u64,
    /// Requests per second, one decimal.
    pub throughput: f64,
    /// Failed requests as a percentage, two decimals.
    pub error_rate_pct: f64,
    pub concurrency: u64,
    pub request_count: u64,
}

/// Timeline entries are the live snapshots taken at each poll.
pub type TimelinePoint = LiveSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    RampUp,
    Running,
    CoolDown,
    Complete,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::RampUp => "ramp-up",
            Phase::Running => "running",
            Phase::CoolDown => "cool-down",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub pct: u8,
    pub phase: Phase,
}
