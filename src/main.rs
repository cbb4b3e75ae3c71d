mod args;
mod entry;
mod progress;
mod shutdown;
mod shutdown_handlers;
mod summary;

use loadpilot::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
