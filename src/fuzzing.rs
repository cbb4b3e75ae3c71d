use crate::config::LoadTestConfig;
use crate::error::{AppError, AppResult, ConfigError};
use crate::metrics::{IncrementalLineReader, MetricPoint, MetricsAccumulator, parse_metric_line};
use crate::plan::{LoadProfile, Stage, build_stages, total_duration_secs};
use crate::report::{TestResult, aggregate};
use crate::script::synthesize_script;

const PROFILES: [LoadProfile; 5] = [
    LoadProfile::Constant,
    LoadProfile::RampUp,
    LoadProfile::Spike,
    LoadProfile::Stress,
    LoadProfile::Soak,
];

#[must_use]
pub fn parse_metric_line_input(input: &str) -> Option<MetricPoint> {
    parse_metric_line(input)
}

/// Feeds `data` to a reader in one piece and split at `split`, returning
/// both line lists (including the flushed trailing fragment).
#[must_use]
pub fn split_lines_input(data: &[u8], split: usize) -> (Vec<String>, Vec<String>) {
    let mut whole = IncrementalLineReader::new();
    let mut whole_lines = whole.feed(data);
    whole_lines.extend(whole.finish());

    let (head, tail) = data.split_at(split.min(data.len()));
    let mut pieces = IncrementalLineReader::new();
    let mut piece_lines = pieces.feed(head);
    piece_lines.extend(pieces.feed(tail));
    piece_lines.extend(pieces.finish());
    (whole_lines, piece_lines)
}

/// Folds arbitrary text as engine output and aggregates it.
#[must_use]
pub fn aggregate_stream_input(input: &str, config: &LoadTestConfig) -> TestResult {
    let mut accumulator = MetricsAccumulator::new(50, 10_000);
    accumulator.fold_lines(input.lines());
    aggregate(&accumulator, config)
}

#[must_use]
pub fn plan_stages_input(profile: u8, duration: u64, users: u64, ramp_up: u64) -> (Vec<Stage>, u64) {
    let index = usize::from(profile).checked_rem(PROFILES.len()).unwrap_or(0);
    let profile = PROFILES.get(index).copied().unwrap_or_default();
    let stages = build_stages(profile, duration, users, ramp_up);
    let total = total_duration_secs(&stages);
    (stages, total)
}

/// Parses a TOML test config and renders its script when it validates.
///
/// # Errors
///
/// Returns an error when parsing, validation or rendering fails.
pub fn render_config_from_toml(input: &str) -> AppResult<String> {
    let config: LoadTestConfig = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: "fuzz.toml".into(),
            source: err,
        })
    })?;
    render(&config)
}

/// Parses a JSON test config and renders its script when it validates.
///
/// # Errors
///
/// Returns an error when parsing, validation or rendering fails.
pub fn render_config_from_json(input: &str) -> AppResult<String> {
    let config: LoadTestConfig = serde_json::from_str(input)?;
    render(&config)
}

fn render(config: &LoadTestConfig) -> AppResult<String> {
    config.validate()?;
    let stages = build_stages(
        config.load_profile,
        config.duration_secs,
        config.virtual_users,
        config.ramp_up_secs,
    );
    Ok(synthesize_script(config, &stages)?)
}
