//! Stage planning: turns a load profile into concurrency stages whose
//! durations add up to the configured test duration.
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[cfg(test)]
mod tests;

/// Smallest hold segment when the test is long enough to afford it.
pub const MIN_SEGMENT_SECS: u64 = 10;
/// Upper bound on each soak ramp.
const SOAK_MAX_RAMP_SECS: u64 = 60;
/// Smallest soak hold when the test is long enough to afford it.
const SOAK_MIN_HOLD_SECS: u64 = 60;
/// Length of each spike transition window.
const SPIKE_WINDOW_SECS: u64 = 10;
/// Baseline load during a spike test, as a percentage of the target.
const SPIKE_BASELINE_PERCENT: u64 = 10;
/// Spike segment weights for the pre-spike, peak and recovery holds.
const SPIKE_WEIGHTS: (u64, u64, u64) = (3, 2, 2);
/// Stress steps as percentages of the target.
const STRESS_STEPS_PERCENT: [u64; 5] = [25, 50, 75, 100, 0];

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LoadProfile {
    #[default]
    Constant,
    #[serde(alias = "rampup", alias = "ramp_up")]
    RampUp,
    Spike,
    Stress,
    Soak,
}

impl LoadProfile {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LoadProfile::Constant => "constant",
            LoadProfile::RampUp => "ramp-up",
            LoadProfile::Spike => "spike",
            LoadProfile::Stress => "stress",
            LoadProfile::Soak => "soak",
        }
    }
}

impl std::str::FromStr for LoadProfile {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(LoadProfile::Constant),
            "ramp-up" | "rampup" | "ramp_up" => Ok(LoadProfile::RampUp),
            "spike" => Ok(LoadProfile::Spike),
            "stress" => Ok(LoadProfile::Stress),
            "soak" => Ok(LoadProfile::Soak),
            _ => Err(ValidationError::UnknownLoadProfile {
                value: value.to_owned(),
            }),
        }
    }
}

/// One engine stage: move linearly to `target` concurrency over `duration_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration_secs: u64,
    pub target: u64,
}

impl Stage {
    const fn new(duration_secs: u64, target: u64) -> Self {
        Self {
            duration_secs,
            target,
        }
    }
}

/// Builds the ordered stage list for a profile.
///
/// Durations always sum to `duration_secs`. Ramps shrink before holds do, so
/// short tests still get a hold segment of up to [`MIN_SEGMENT_SECS`].
#[must_use]
pub fn build_stages(
    profile: LoadProfile,
    duration_secs: u64,
    virtual_users: u64,
    ramp_up_secs: u64,
) -> Vec<Stage> {
    match profile {
        LoadProfile::Constant => constant(duration_secs, virtual_users, ramp_up_secs),
        LoadProfile::RampUp => ramp_up(duration_secs, virtual_users, ramp_up_secs),
        LoadProfile::Spike => spike(duration_secs, virtual_users),
        LoadProfile::Stress => stress(duration_secs, virtual_users),
        LoadProfile::Soak => soak(duration_secs, virtual_users, ramp_up_secs),
    }
}

#[must_use]
pub fn total_duration_secs(stages: &[Stage]) -> u64 {
    stages
        .iter()
        .fold(0u64, |sum, stage| sum.saturating_add(stage.duration_secs))
}

fn constant(duration: u64, vus: u64, ramp: u64) -> Vec<Stage> {
    let hold = duration
        .saturating_sub(ramp)
        .max(MIN_SEGMENT_SECS.min(duration));
    let ramp = duration.saturating_sub(hold);
    vec![Stage::new(ramp, vus), Stage::new(hold, vus)]
}

fn ramp_up(duration: u64, vus: u64, ramp: u64) -> Vec<Stage> {
    let hold = duration
        .saturating_sub(ramp.saturating_mul(2))
        .max(MIN_SEGMENT_SECS.min(duration));
    let edges = duration.saturating_sub(hold);
    let down = edges / 2;
    let up = edges.saturating_sub(down);
    vec![
        Stage::new(up, vus),
        Stage::new(hold, vus),
        Stage::new(down, 0),
    ]
}

fn spike(duration: u64, vus: u64) -> Vec<Stage> {
    let window = SPIKE_WINDOW_SECS.min(duration / 5);
    let rest = duration.saturating_sub(window.saturating_mul(2));
    let (before_weight, peak_weight, after_weight) = SPIKE_WEIGHTS;
    let weight_sum = before_weight
        .saturating_add(peak_weight)
        .saturating_add(after_weight);
    let before = rest
        .saturating_mul(before_weight)
        .checked_div(weight_sum)
        .unwrap_or(0);
    let peak = rest
        .saturating_mul(peak_weight)
        .checked_div(weight_sum)
        .unwrap_or(0);
    let after = rest.saturating_sub(before).saturating_sub(peak);
    let baseline = percent_of(vus, SPIKE_BASELINE_PERCENT);
    vec![
        Stage::new(before, baseline),
        Stage::new(window, vus),
        Stage::new(peak, vus),
        Stage::new(window, baseline),
        Stage::new(after, baseline),
    ]
}

fn stress(duration: u64, vus: u64) -> Vec<Stage> {
    let step_count = STRESS_STEPS_PERCENT.len() as u64;
    let step = duration.checked_div(step_count).unwrap_or(0);
    let last = duration.saturating_sub(step.saturating_mul(step_count.saturating_sub(1)));
    let final_index = STRESS_STEPS_PERCENT.len().saturating_sub(1);
    STRESS_STEPS_PERCENT
        .iter()
        .enumerate()
        .map(|(idx, percent)| {
            let length = if idx == final_index { last } else { step };
            Stage::new(length, percent_of(vus, *percent))
        })
        .collect()
}

fn soak(duration: u64, vus: u64, ramp: u64) -> Vec<Stage> {
    let hold_floor = SOAK_MIN_HOLD_SECS.min(duration);
    let edge = ramp
        .min(SOAK_MAX_RAMP_SECS)
        .min(duration.saturating_sub(hold_floor) / 2);
    let hold = duration.saturating_sub(edge.saturating_mul(2));
    vec![
        Stage::new(edge, vus),
        Stage::new(hold, vus),
        Stage::new(edge, 0),
    ]
}

const fn percent_of(value: u64, percent: u64) -> u64 {
    value.saturating_mul(percent) / 100
}
