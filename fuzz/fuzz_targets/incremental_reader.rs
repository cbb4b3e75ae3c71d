#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((split, body)) = data.split_first() else {
        return;
    };
    let split = usize::from(*split).saturating_mul(7);
    let (whole, pieces) = loadpilot::fuzzing::split_lines_input(body, split);
    debug_assert_eq!(whole, pieces);
    for line in &whole {
        debug_assert!(!line.is_empty());
        debug_assert!(!line.contains('\n'));
    }
});
