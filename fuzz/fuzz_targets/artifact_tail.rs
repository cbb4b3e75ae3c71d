#![no_main]

use libfuzzer_sys::fuzz_target;
use loadpilot::metrics::{ArtifactTail, MetricsAccumulator};
use std::cell::RefCell;
use std::io::Write;

thread_local! {
    static RUNTIME: RefCell<Option<tokio::runtime::Runtime>> = RefCell::new(None);
}

fn with_runtime<F>(action: F)
where
    F: FnOnce(&tokio::runtime::Runtime),
{
    RUNTIME.with(|cell| {
        if cell.borrow().is_none() {
            if let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                *cell.borrow_mut() = Some(runtime);
            }
        }

        if let Some(runtime) = cell.borrow().as_ref() {
            action(runtime);
        }
    });
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }
    let Ok(mut file) = tempfile::NamedTempFile::new() else {
        return;
    };
    let split = data.len() / 2;
    let (head, tail) = data.split_at(split);

    with_runtime(|runtime| {
        runtime.block_on(async {
            let mut accumulator = MetricsAccumulator::new(50, 10_000);
            let mut follower = ArtifactTail::new(file.path());
            if file.write_all(head).and_then(|()| file.flush()).is_err() {
                return;
            }
            let first = follower.poll(&mut accumulator).await;
            if file.write_all(tail).and_then(|()| file.flush()).is_err() {
                return;
            }
            let rest = follower.drain(&mut accumulator).await;
            if first.is_ok() && rest.is_ok() {
                debug_assert_eq!(follower.offset(), data.len() as u64);
                debug_assert!(accumulator.failed_count() <= accumulator.request_count());
            }
        });
    });
});
