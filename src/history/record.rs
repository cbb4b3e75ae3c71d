use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{HttpMethod, LoadTestConfig};
use crate::engine::SessionStatus;
use crate::report::TestResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub method: HttpMethod,
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub avg_time: u64,
    pub throughput: f64,
    pub error_rate: f64,
}

/// One finished test as persisted in the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub name: String,
    pub target_url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: u64,
    pub config: LoadTestConfig,
    pub endpoints_summary: Vec<EndpointSummary>,
    pub status: SessionStatus,
    pub result_summary: ResultSummary,
    pub full_results: TestResult,
    /// When the record was written.
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    #[must_use]
    pub fn new(
        test_id: &str,
        config: &LoadTestConfig,
        status: SessionStatus,
        start_time: DateTime<Utc>,
        result: &TestResult,
    ) -> Self {
        let end_time = Utc::now();
        let duration_secs = u64::try_from(
            end_time
                .signed_duration_since(start_time)
                .num_seconds()
                .max(0),
        )
        .unwrap_or(0);
        Self {
            id: test_id.to_owned(),
            name: config.display_name(test_id),
            target_url: config.target_url.clone(),
            start_time,
            end_time,
            duration_secs,
            config: config.clone(),
            endpoints_summary: config
                .endpoints
                .iter()
                .map(|endpoint| EndpointSummary {
                    method: endpoint.method,
                    endpoint: endpoint.endpoint.clone(),
                })
                .collect(),
            status,
            result_summary: ResultSummary {
                avg_time: result.summary.avg_response_time_ms,
                throughput: result.summary.throughput_req_per_sec,
                error_rate: result.summary.error_rate_pct,
            },
            full_results: result.clone(),
            timestamp: end_time,
        }
    }
}
