//! Engine output parsing, incremental tailing, and running aggregation.
mod accumulator;
mod percentiles;
mod reader;
mod snapshot;
mod tail;
mod types;

#[cfg(test)]
mod tests;

pub use accumulator::{EndpointBucket, MetricsAccumulator};
pub use percentiles::{PERCENTILE_P95, PERCENTILE_P99, compute_percentiles, percentile, sort_samples};
pub use reader::IncrementalLineReader;
pub use snapshot::{finished_progress, live_progress};
pub use tail::{ArtifactTail, read_appended};
pub use types::{
    LiveSnapshot, MetricKind, MetricPoint, Phase, Progress, TimelinePoint, parse_metric_line,
};

pub(crate) use accumulator::{error_rate_pct, mean, throughput};
pub(crate) use snapshot::whole_ms;
