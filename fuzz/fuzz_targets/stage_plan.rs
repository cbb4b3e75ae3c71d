#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 13 {
        return;
    }
    let profile = data[0];
    let duration = u64::from(u32::from_le_bytes([data[1], data[2], data[3], data[4]]));
    let users = u64::from(u32::from_le_bytes([data[5], data[6], data[7], data[8]]));
    let ramp_up = u64::from(u32::from_le_bytes([data[9], data[10], data[11], data[12]]));
    let (stages, total) = loadpilot::fuzzing::plan_stages_input(profile, duration, users, ramp_up);
    debug_assert!(!stages.is_empty());
    debug_assert_eq!(total, duration);
    for stage in &stages {
        debug_assert!(stage.target <= users);
    }
});
