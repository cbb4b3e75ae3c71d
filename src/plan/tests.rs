use super::*;

const PROFILES: [LoadProfile; 5] = [
    LoadProfile::Constant,
    LoadProfile::RampUp,
    LoadProfile::Spike,
    LoadProfile::Stress,
    LoadProfile::Soak,
];

#[test]
fn constant_profile_ramps_then_holds() -> Result<(), String> {
    let stages = build_stages(LoadProfile::Constant, 30, 10, 5);
    let expected = vec![Stage::new(5, 10), Stage::new(25, 10)];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn ramp_up_profile_ramps_down_to_zero() -> Result<(), String> {
    let stages = build_stages(LoadProfile::RampUp, 120, 40, 20);
    let expected = vec![Stage::new(20, 40), Stage::new(80, 40), Stage::new(20, 0)];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn ramp_up_profile_keeps_minimum_hold_when_ramps_overflow() -> Result<(), String> {
    let stages = build_stages(LoadProfile::RampUp, 60, 10, 30);
    let expected = vec![Stage::new(25, 10), Stage::new(10, 10), Stage::new(25, 0)];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn spike_profile_oscillates_around_baseline() -> Result<(), String> {
    let stages = build_stages(LoadProfile::Spike, 100, 50, 0);
    let targets: Vec<u64> = stages.iter().map(|stage| stage.target).collect();
    if targets != vec![5, 50, 50, 5, 5] {
        return Err(format!("Unexpected targets: {:?}", targets));
    }
    let durations: Vec<u64> = stages.iter().map(|stage| stage.duration_secs).collect();
    if durations != vec![34, 10, 22, 10, 24] {
        return Err(format!("Unexpected durations: {:?}", durations));
    }
    Ok(())
}

#[test]
fn stress_profile_steps_in_quarters() -> Result<(), String> {
    let stages = build_stages(LoadProfile::Stress, 52, 100, 0);
    let expected = vec![
        Stage::new(10, 25),
        Stage::new(10, 50),
        Stage::new(10, 75),
        Stage::new(10, 100),
        Stage::new(12, 0),
    ];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn soak_profile_caps_ramps_at_one_minute() -> Result<(), String> {
    let stages = build_stages(LoadProfile::Soak, 3600, 20, 300);
    let expected = vec![Stage::new(60, 20), Stage::new(3480, 20), Stage::new(60, 0)];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn soak_profile_handles_short_durations() -> Result<(), String> {
    let stages = build_stages(LoadProfile::Soak, 30, 5, 60);
    let expected = vec![Stage::new(0, 5), Stage::new(30, 5), Stage::new(0, 0)];
    if stages != expected {
        return Err(format!("Unexpected stages: {:?}", stages));
    }
    Ok(())
}

#[test]
fn stage_durations_sum_to_requested_duration() -> Result<(), String> {
    let durations = [1u64, 2, 5, 9, 10, 11, 30, 59, 61, 119, 121, 600, 3601];
    let ramps = [0u64, 1, 5, 30, 60, 90, 1000];
    let users = [0u64, 1, 7, 10, 250];
    for profile in PROFILES {
        for duration in durations {
            for ramp in ramps {
                for vus in users {
                    let stages = build_stages(profile, duration, vus, ramp);
                    let total = total_duration_secs(&stages);
                    if total != duration {
                        return Err(format!(
                            "{:?} D={} R={} V={} summed to {}",
                            profile, duration, ramp, vus, total
                        ));
                    }
                    if stages.iter().any(|stage| stage.target > vus) {
                        return Err(format!("{:?} overshoots target {}", profile, vus));
                    }
                    let last = stages.last().ok_or_else(|| "No stages".to_owned())?;
                    let previous = stages
                        .len()
                        .checked_sub(2)
                        .and_then(|idx| stages.get(idx))
                        .ok_or_else(|| "Single stage plan".to_owned())?;
                    if last.target != 0 && last.target != previous.target {
                        return Err(format!(
                            "{:?} ends on an unheld target {:?}",
                            profile, stages
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

#[test]
fn profile_names_round_trip_through_serde() -> Result<(), String> {
    let parsed: LoadProfile =
        serde_json::from_str("\"rampup\"").map_err(|err| format!("parse failed: {}", err))?;
    if parsed != LoadProfile::RampUp || parsed.as_str() != "ramp-up" {
        return Err(format!("Unexpected profile: {:?}", parsed));
    }
    Ok(())
}

#[test]
fn profile_from_str_accepts_aliases_and_rejects_unknown() -> Result<(), String> {
    for (input, expected) in [
        ("Constant", LoadProfile::Constant),
        ("ramp_up", LoadProfile::RampUp),
        (" spike ", LoadProfile::Spike),
        ("SOAK", LoadProfile::Soak),
    ] {
        let parsed: LoadProfile = input
            .parse()
            .map_err(|err| format!("'{}' failed: {}", input, err))?;
        if parsed != expected {
            return Err(format!("'{}' parsed as {:?}", input, parsed));
        }
    }
    match "burst".parse::<LoadProfile>() {
        Err(ValidationError::UnknownLoadProfile { value }) if value == "burst" => Ok(()),
        other => Err(format!("Unexpected parse result: {:?}", other)),
    }
}
