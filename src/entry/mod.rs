mod commands;

use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};

use loadpilot::config::{OrchestratorSettings, default_history_path, default_work_dir};
use loadpilot::error::AppResult;
use loadpilot::history::JsonFileHistoryStore;
use loadpilot::logger::init_logging;
use loadpilot::orchestrator::Orchestrator;

use crate::args::{CliArgs, Command};

pub(crate) fn run() -> AppResult<()> {
    let matches = CliArgs::command().get_matches();
    let args = CliArgs::from_arg_matches(&matches)?;

    init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

async fn run_async(args: CliArgs) -> AppResult<()> {
    let orchestrator = build_orchestrator(&args);
    let no_color = args.no_color;
    match args.command {
        Command::Run(run) => commands::run_test(&orchestrator, run, no_color).await,
        Command::Script(script) => commands::print_script(&orchestrator, script).await,
        Command::Probe => commands::probe(&orchestrator).await,
        Command::History(history) => commands::list_history(&orchestrator, &history).await,
        Command::Show(show) => commands::show(&orchestrator, &show).await,
    }
}

fn build_orchestrator(args: &CliArgs) -> Orchestrator {
    let keep_artifacts = matches!(&args.command, Command::Run(run) if run.keep_artifacts);
    let settings = OrchestratorSettings {
        engine: args.engine.clone(),
        work_dir: args.work_dir.clone().unwrap_or_else(default_work_dir),
        // The CLI exits right after the run, so clean up without delay.
        cleanup_grace: Duration::ZERO,
        keep_artifacts,
        ..OrchestratorSettings::default()
    };
    let history_path = args.history.clone().unwrap_or_else(default_history_path);
    tracing::debug!("History file: {}", history_path.display());
    Orchestrator::new(settings, Arc::new(JsonFileHistoryStore::new(history_path)))
}
