#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(script) = loadpilot::fuzzing::render_config_from_toml(input) {
            debug_assert!(script.contains("export const options"));
            let again = loadpilot::fuzzing::render_config_from_toml(input);
            debug_assert_eq!(again.ok().as_deref(), Some(script.as_str()));
        }
    }
});
