use super::types::{Phase, Progress};

/// Live progress never reaches this; only the terminal handler reports 100.
const MAX_LIVE_PROGRESS: u64 = 99;
/// Progress past this percentage is reported as cool-down.
const COOL_DOWN_AFTER_PCT: u64 = 90;
const PERCENT: u64 = 100;

/// Progress of a still-running test.
///
/// `pct` is `min(99, round(elapsed / total * 100))`. The phase is ramp-up
/// while `elapsed < ramp_up_secs`, cool-down once `pct` exceeds 90, and
/// running otherwise.
#[must_use]
pub fn live_progress(elapsed_secs: u64, total_secs: u64, ramp_up_secs: u64) -> Progress {
    let half = total_secs.checked_div(2).unwrap_or(0);
    let pct = elapsed_secs
        .saturating_mul(PERCENT)
        .saturating_add(half)
        .checked_div(total_secs)
        .unwrap_or(0)
        .min(MAX_LIVE_PROGRESS);

    let phase = if elapsed_secs < ramp_up_secs {
        Phase::RampUp
    } else if pct > COOL_DOWN_AFTER_PCT {
        Phase::CoolDown
    } else {
        Phase::Running
    };

    Progress {
        pct: u8::try_from(pct).unwrap_or(u8::MAX),
        phase,
    }
}

/// Progress reported once the engine has exited.
#[must_use]
pub const fn finished_progress() -> Progress {
    Progress {
        pct: 100,
        phase: Phase::Complete,
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds a millisecond value to a whole, non-negative count.
pub(crate) fn whole_ms(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}
