use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};

use super::snapshot::{round_to, whole_ms};
use super::types::{LiveSnapshot, MetricKind, MetricPoint, TimelinePoint, parse_metric_line};

const MILLIS_PER_SEC: i64 = 1000;

/// Samples and counters observed for one endpoint key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointBucket {
    pub times: Vec<f64>,
    pub errors: u64,
    pub requests: u64,
}

/// Running aggregate for one test, fed from the engine output stream.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    recent: VecDeque<f64>,
    recent_window: usize,
    samples: Vec<f64>,
    max_samples: usize,
    samples_truncated: bool,
    duration_sum_ms: f64,
    duration_count: u64,
    request_count: u64,
    failed_count: u64,
    concurrency: u64,
    peak_concurrency: u64,
    per_endpoint: BTreeMap<String, EndpointBucket>,
    failure_statuses: BTreeMap<u16, u64>,
    timeline: Vec<TimelinePoint>,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    skipped_lines: u64,
}

impl MetricsAccumulator {
    #[must_use]
    pub fn new(recent_window: usize, max_samples: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(recent_window),
            recent_window: recent_window.max(1),
            samples: Vec::new(),
            max_samples,
            samples_truncated: false,
            duration_sum_ms: 0.0,
            duration_count: 0,
            request_count: 0,
            failed_count: 0,
            concurrency: 0,
            peak_concurrency: 0,
            per_endpoint: BTreeMap::new(),
            failure_statuses: BTreeMap::new(),
            timeline: Vec::new(),
            first_timestamp: None,
            last_timestamp: None,
            skipped_lines: 0,
        }
    }

    /// Parses and folds one output line. Returns whether it was a
    /// recognized sample; anything else is counted and skipped.
    pub fn fold_line(&mut self, line: &str) -> bool {
        let Some(point) = parse_metric_line(line) else {
            self.skipped_lines = self.skipped_lines.saturating_add(1);
            return false;
        };
        self.apply(&point);
        true
    }

    /// Folds a batch of lines, returning how many were recognized.
    pub fn fold_lines<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| self.fold_line(line.as_ref()))
            .count()
    }

    pub fn apply(&mut self, point: &MetricPoint) {
        match point.kind {
            MetricKind::RequestDuration => self.record_duration(point),
            MetricKind::Requests => {
                self.request_count = self.request_count.saturating_add(count_of(point.value));
            }
            MetricKind::RequestFailed => self.record_failure(point),
            MetricKind::Concurrency => {
                self.concurrency = count_of(point.value);
                self.peak_concurrency = self.peak_concurrency.max(self.concurrency);
            }
        }

        if let Some(time) = point.time {
            self.last_timestamp = Some(time);
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(time);
            }
        }
    }

    fn record_duration(&mut self, point: &MetricPoint) {
        let value = point.value.max(0.0);
        if self.recent.len() >= self.recent_window {
            self.recent.pop_front();
        }
        self.recent.push_back(value);

        self.duration_sum_ms += value;
        self.duration_count = self.duration_count.saturating_add(1);
        if self.samples.len() < self.max_samples {
            self.samples.push(value);
        } else {
            self.samples_truncated = true;
        }

        let max_samples = self.max_samples;
        if let Some(endpoint) = point.endpoint.as_deref() {
            let bucket = self.bucket_mut(endpoint);
            if bucket.times.len() < max_samples {
                bucket.times.push(value);
            }
            bucket.requests = bucket.requests.saturating_add(1);
        }
    }

    fn record_failure(&mut self, point: &MetricPoint) {
        let failures = count_of(point.value);
        self.failed_count = self.failed_count.saturating_add(failures);
        if failures == 0 {
            return;
        }
        if let Some(status) = point.status {
            let entry = self.failure_statuses.entry(status).or_insert(0);
            *entry = entry.saturating_add(failures);
        }
        if let Some(endpoint) = point.endpoint.as_deref() {
            let bucket = self.bucket_mut(endpoint);
            bucket.errors = bucket.errors.saturating_add(failures);
        }
    }

    fn bucket_mut(&mut self, endpoint: &str) -> &mut EndpointBucket {
        self.per_endpoint.entry(endpoint.to_owned()).or_default()
    }

    /// Whole seconds between the first and last timestamped sample.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<u64> {
        let (first, last) = (self.first_timestamp?, self.last_timestamp?);
        let millis = last.signed_duration_since(first).num_milliseconds();
        u64::try_from(millis.checked_div(MILLIS_PER_SEC).unwrap_or(0)).ok()
    }

    /// Live view over the recent window and the running totals.
    #[must_use]
    pub fn live_snapshot(&self) -> LiveSnapshot {
        let elapsed_secs = self.elapsed_secs().unwrap_or(0);
        let recent_avg = mean(self.recent.iter().copied(), self.recent.len());
        LiveSnapshot {
            elapsed_secs,
            avg_response_time_ms: whole_ms(recent_avg),
            throughput: throughput(self.request_count, elapsed_secs),
            error_rate_pct: error_rate_pct(self.failed_count(), self.request_count),
            concurrency: self.concurrency,
            request_count: self.request_count,
        }
    }

    /// Takes a live snapshot and appends it to the timeline.
    pub fn record_snapshot(&mut self) -> LiveSnapshot {
        let snapshot = self.live_snapshot();
        self.timeline.push(snapshot);
        snapshot
    }

    #[must_use]
    pub const fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Failed requests, never more than the total request count.
    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.failed_count.min(self.request_count)
    }

    #[must_use]
    pub const fn concurrency(&self) -> u64 {
        self.concurrency
    }

    #[must_use]
    pub const fn peak_concurrency(&self) -> u64 {
        self.peak_concurrency
    }

    /// Captured duration samples, in arrival order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    pub const fn samples_truncated(&self) -> bool {
        self.samples_truncated
    }

    /// Mean over every duration sample seen, including ones past the cap.
    #[must_use]
    pub const fn mean_duration_ms(&self) -> f64 {
        if self.duration_count == 0 {
            return 0.0;
        }
        self.duration_sum_ms / self.duration_count as f64
    }

    #[must_use]
    pub const fn per_endpoint(&self) -> &BTreeMap<String, EndpointBucket> {
        &self.per_endpoint
    }

    /// Failure counts keyed by the `status` tag of failed requests.
    #[must_use]
    pub const fn failure_statuses(&self) -> &BTreeMap<u16, u64> {
        &self.failure_statuses
    }

    #[must_use]
    pub fn timeline(&self) -> &[TimelinePoint] {
        &self.timeline
    }

    #[must_use]
    pub const fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

/// Engine counters arrive as floats; negative or fractional noise is clamped.
fn count_of(value: f64) -> u64 {
    if value <= 0.0 {
        return 0;
    }
    value.round() as u64
}

pub(crate) fn mean<I>(values: I, len: usize) -> f64
where
    I: Iterator<Item = f64>,
{
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}

/// Requests per second over `elapsed_secs`, one decimal; zero when no time passed.
pub(crate) fn throughput(requests: u64, elapsed_secs: u64) -> f64 {
    if elapsed_secs == 0 {
        return 0.0;
    }
    round_to(requests as f64 / elapsed_secs as f64, 1)
}

/// Failed over total as a percentage, two decimals; zero when nothing ran.
pub(crate) fn error_rate_pct(failed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(failed as f64 / total as f64 * 100.0, 2)
}
