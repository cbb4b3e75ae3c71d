use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use loadpilot::engine::INSTALL_HINT;
use loadpilot::error::{AppError, AppResult, EngineError, OrchestratorError};
use loadpilot::events::{EventReceiver, TestEvent};
use loadpilot::history::HistoryStore;
use loadpilot::orchestrator::{Orchestrator, StopOutcome};
use loadpilot::report::TestResult;

use crate::args::{HistoryArgs, RunArgs, ScriptArgs, ShowArgs};
use crate::progress::{ProgressView, finish_progress_line, render_progress_line};
use crate::shutdown::{ShutdownReceiver, shutdown_channel};
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::summary::{history_lines, summary_lines};

/// How often the CLI checks whether the session finished its cleanup.
const CLEANUP_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Slack on top of the stop-kill timeout before giving up on cleanup.
const CLEANUP_SLACK: Duration = Duration::from_secs(5);

enum RunOutcome {
    Finished { results: Box<TestResult>, stopped: bool },
    Failed(String),
}

pub(super) async fn run_test(orchestrator: &Orchestrator, run: RunArgs, no_color: bool) -> AppResult<()> {
    let json = run.json;
    let config = run.test.into_config()?;
    let mut events = orchestrator.subscribe();
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let test_id = match orchestrator.start_test(config).await {
        Ok(test_id) => test_id,
        Err(err) => {
            drop(shutdown_tx.send(()));
            signal_handle.await?;
            return Err(err);
        }
    };
    tracing::info!("Started test {}", test_id);

    let outcome = follow(orchestrator, &test_id, &mut events, &mut shutdown_rx, no_color).await;
    drop(shutdown_tx.send(()));
    signal_handle.await?;
    if let Err(err) = finish_progress_line() {
        tracing::debug!("Failed to finish progress line: {}", err);
    }
    wait_for_cleanup(orchestrator, &test_id).await;

    match outcome {
        RunOutcome::Finished { results, stopped } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                if stopped {
                    println!("Stopped by request; partial results follow.");
                }
                for line in summary_lines(&test_id, &results) {
                    println!("{}", line);
                }
            }
            Ok(())
        }
        RunOutcome::Failed(message) => Err(AppError::orchestrator(OrchestratorError::RunFailed {
            test_id,
            message,
        })),
    }
}

async fn follow(
    orchestrator: &Orchestrator,
    test_id: &str,
    events: &mut EventReceiver,
    shutdown_rx: &mut ShutdownReceiver,
    no_color: bool,
) -> RunOutcome {
    let mut stop_sent = false;
    let mut stopped = false;
    let mut requests = 0u64;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv(), if !stop_sent => {
                stop_sent = true;
                match orchestrator.stop_test(test_id).await {
                    StopOutcome::Stopped => tracing::info!("Stopping {}", test_id),
                    StopOutcome::NotFound => tracing::debug!("{} already finished", test_id),
                }
            }
            event = events.recv() => match event {
                Ok(event) if event.test_id() != test_id => {}
                Ok(TestEvent::Started { .. }) => {}
                Ok(TestEvent::Metrics { snapshot, .. }) => requests = snapshot.request_count,
                Ok(TestEvent::Progress { progress, phase, elapsed, concurrency, .. }) => {
                    let view = ProgressView {
                        pct: progress,
                        phase,
                        elapsed_secs: elapsed,
                        concurrency,
                        requests,
                    };
                    if let Err(err) = render_progress_line(&view, no_color) {
                        tracing::debug!("Failed to render progress: {}", err);
                    }
                }
                Ok(TestEvent::Stopped { .. }) => stopped = true,
                Ok(TestEvent::Complete { results, .. }) => {
                    return RunOutcome::Finished { results, stopped };
                }
                Ok(TestEvent::Error { error, .. }) => return RunOutcome::Failed(error),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} events from a slow terminal", skipped);
                }
                Err(RecvError::Closed) => {
                    return RunOutcome::Failed("event stream closed".to_owned());
                }
            }
        }
    }
}

/// Gives the session driver time to reap the engine and delete artifacts
/// before the runtime shuts down.
async fn wait_for_cleanup(orchestrator: &Orchestrator, test_id: &str) {
    let limit = orchestrator
        .settings()
        .stop_kill_timeout
        .saturating_add(CLEANUP_SLACK);
    let waited = tokio::time::timeout(limit, async {
        while orchestrator.registry().contains(test_id) {
            tokio::time::sleep(CLEANUP_POLL_INTERVAL).await;
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!("Session {} did not clean up within {:?}", test_id, limit);
    }
}

pub(super) async fn print_script(orchestrator: &Orchestrator, script: ScriptArgs) -> AppResult<()> {
    let config = script.test.into_config()?;
    let rendered = orchestrator.render_script(&config)?;
    match script.out {
        Some(path) => {
            tokio::fs::write(&path, rendered).await?;
            tracing::info!("Wrote script to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

pub(super) async fn probe(orchestrator: &Orchestrator) -> AppResult<()> {
    let engine = orchestrator.settings().engine.clone();
    let capability = orchestrator.probe().await;
    if !capability.available {
        return Err(AppError::engine(EngineError::Unavailable {
            engine,
            hint: INSTALL_HINT,
        }));
    }
    println!("Engine: {}", engine);
    println!(
        "Version: {}",
        capability.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

pub(super) async fn list_history(orchestrator: &Orchestrator, history: &HistoryArgs) -> AppResult<()> {
    let records = orchestrator.history().list(history.limit).await?;
    for line in history_lines(&records) {
        println!("{}", line);
    }
    Ok(())
}

pub(super) async fn show(orchestrator: &Orchestrator, show: &ShowArgs) -> AppResult<()> {
    let result = orchestrator.get_result(&show.id).await?;
    if show.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in summary_lines(&show.id, &result) {
            println!("{}", line);
        }
    }
    Ok(())
}
