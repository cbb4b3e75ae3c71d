#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Some(point) = loadpilot::fuzzing::parse_metric_line_input(input) {
            debug_assert!(point.value.is_finite());
            if let Some(endpoint) = point.endpoint.as_deref() {
                debug_assert!(!endpoint.is_empty());
            }
        }
    }
});
