use std::collections::BTreeMap;

use super::types::{BreakdownSource, ErrorBreakdownEntry};

/// Canonical failure classes and their share of failures, in percent, used
/// when the stream carries no status codes.
const ESTIMATED_SPLIT: [(u16, u64); 5] = [(429, 30), (503, 25), (504, 20), (500, 15), (401, 10)];
const PERCENT: u64 = 100;

/// Breaks failures down by HTTP status.
///
/// Observed status codes are preferred, and failures without a status tag
/// are kept as one untagged entry so the counts add up to `failed_requests`.
/// Without any tags the failure count is split 30/25/20/15/10 across
/// 429/503/504/500/401 and flagged as an estimate.
#[must_use]
pub fn error_breakdown(
    failed_requests: u64,
    observed: &BTreeMap<u16, u64>,
) -> (Vec<ErrorBreakdownEntry>, BreakdownSource) {
    let observed_total = observed.values().fold(0_u64, |acc, count| acc.saturating_add(*count));
    if observed_total > 0 {
        let mut entries: Vec<ErrorBreakdownEntry> = observed
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(code, count)| entry(*code, *count))
            .collect();
        let untagged = failed_requests.saturating_sub(observed_total);
        if untagged > 0 {
            entries.push(ErrorBreakdownEntry {
                code: None,
                name: "Untagged".to_owned(),
                count: untagged,
                description: "Failure reported without a status code".to_owned(),
            });
        }
        entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.code.cmp(&b.code)));
        return (entries, BreakdownSource::Observed);
    }

    let entries = ESTIMATED_SPLIT
        .iter()
        .map(|(code, share)| {
            let count = failed_requests
                .saturating_mul(*share)
                .checked_div(PERCENT)
                .unwrap_or(0);
            entry(*code, count)
        })
        .collect();
    (entries, BreakdownSource::Estimated)
}

fn entry(code: u16, count: u64) -> ErrorBreakdownEntry {
    let (name, description) = describe(code);
    ErrorBreakdownEntry {
        code: Some(code),
        name: name.to_owned(),
        count,
        description: description.to_owned(),
    }
}

const fn describe(code: u16) -> (&'static str, &'static str) {
    match code {
        0 => ("Connection Error", "Request failed before a response was received"),
        400 => ("Bad Request", "Request rejected as malformed"),
        401 => ("Unauthorized", "Authentication failed"),
        403 => ("Forbidden", "Access denied"),
        404 => ("Not Found", "Resource does not exist"),
        408 => ("Request Timeout", "Server timed out waiting for the request"),
        429 => ("Too Many Requests", "Rate limit exceeded"),
        500 => ("Internal Server Error", "Server error"),
        502 => ("Bad Gateway", "Invalid response from upstream"),
        503 => ("Service Unavailable", "Backend service unavailable"),
        504 => ("Gateway Timeout", "Request timed out"),
        400..=499 => ("Client Error", "Request rejected by the server"),
        500..=599 => ("Server Error", "Server failed to handle the request"),
        _ => ("Unexpected Status", "Response status counted as a failure"),
    }
}
