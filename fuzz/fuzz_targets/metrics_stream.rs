#![no_main]

use libfuzzer_sys::fuzz_target;
use loadpilot::config::{LoadTestConfig, SelectedEndpoint};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let config = LoadTestConfig::new(
        "https://fuzz.example.com",
        vec![SelectedEndpoint {
            method: Default::default(),
            endpoint: "/fuzz".to_owned(),
            description: None,
            body: None,
        }],
    );
    let result = loadpilot::fuzzing::aggregate_stream_input(input, &config);
    let summary = &result.summary;
    debug_assert_eq!(
        summary.successful_requests.saturating_add(summary.failed_requests),
        summary.total_requests
    );
    debug_assert!(summary.p95_ms <= summary.p99_ms);
    if summary.total_requests == 0 {
        debug_assert!(summary.error_rate_pct == 0.0);
    }
    debug_assert_eq!(result.endpoints.len(), 1);
});
