use std::process::ExitStatus;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::LoadTestConfig;
use crate::engine::{EngineProcess, LifecycleEvent, SessionStatus, transition};
use crate::error::EngineError;
use crate::events::{TestEvent, publish};
use crate::history::HistoryRecord;
use crate::metrics::{ArtifactTail, MetricsAccumulator, live_progress};
use crate::report::{TestResult, aggregate};

use super::Inner;
use super::artifacts::SessionArtifacts;

/// Requests sent from the service to a running session driver.
#[derive(Debug)]
pub enum SessionCommand {
    Stop {
        ack: oneshot::Sender<Result<(), EngineError>>,
    },
}

enum Step {
    Tick,
    Command(Option<SessionCommand>),
    Exited(Result<ExitStatus, EngineError>),
}

enum Ending {
    Exited(Result<ExitStatus, EngineError>),
    Stopped,
}

/// Owns one engine run: the process, the artifact tail and the accumulator.
/// The accumulator has no other writer.
pub(super) struct SessionDriver {
    pub(super) test_id: String,
    pub(super) config: Arc<LoadTestConfig>,
    pub(super) inner: Arc<Inner>,
    pub(super) process: EngineProcess,
    pub(super) control: mpsc::Receiver<SessionCommand>,
    pub(super) tail: ArtifactTail,
    pub(super) accumulator: MetricsAccumulator,
    pub(super) total_duration_secs: u64,
    pub(super) started_at: DateTime<Utc>,
    pub(super) artifacts: SessionArtifacts,
}

impl SessionDriver {
    pub(super) async fn run(mut self) {
        let settings = &self.inner.settings;
        let first_tick = Instant::now()
            .checked_add(settings.initial_poll_delay)
            .unwrap_or_else(Instant::now);
        let mut poll = tokio::time::interval_at(first_tick, settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut control_open = true;

        let ending = loop {
            let step = tokio::select! {
                exit = self.process.wait() => Step::Exited(exit),
                command = self.control.recv(), if control_open => Step::Command(command),
                _ = poll.tick() => Step::Tick,
            };
            match step {
                Step::Tick => self.on_tick().await,
                Step::Command(Some(SessionCommand::Stop { ack })) => {
                    let signalled = self.process.terminate();
                    if let Err(err) = &signalled {
                        tracing::warn!("[{}] {}", self.test_id, err);
                    }
                    if ack.send(signalled).is_err() {
                        tracing::debug!("[{}] Stop requester went away", self.test_id);
                    }
                    break Ending::Stopped;
                }
                Step::Command(None) => control_open = false,
                Step::Exited(exit) => break Ending::Exited(exit),
            }
        };
        self.close_control();

        match ending {
            Ending::Exited(exit) => self.finish_exited(exit).await,
            Ending::Stopped => self.finish_stopped().await,
        }

        tokio::time::sleep(self.inner.settings.cleanup_grace).await;
        self.inner.registry.remove(&self.test_id);
        if !self.inner.settings.keep_artifacts {
            self.artifacts.remove().await;
        }
        tracing::debug!("[{}] Session cleaned up", self.test_id);
    }

    /// Answers stop requests that were queued after the engine already
    /// exited. The exit handler reports the stop.
    fn close_control(&mut self) {
        self.control.close();
        while let Ok(SessionCommand::Stop { ack }) = self.control.try_recv() {
            if ack.send(Ok(())).is_err() {
                tracing::debug!("[{}] Stop requester went away", self.test_id);
            }
        }
    }

    async fn on_tick(&mut self) {
        let before = self.tail.offset();
        if let Err(err) = self.tail.poll(&mut self.accumulator).await {
            tracing::warn!("[{}] {}", self.test_id, err);
            return;
        }
        if self.tail.offset() == before {
            return;
        }

        let snapshot = self.accumulator.record_snapshot();
        let progress = live_progress(
            snapshot.elapsed_secs,
            self.total_duration_secs,
            self.config.ramp_up_secs,
        );
        self.inner.registry.with_entry(&self.test_id, |entry| {
            entry.concurrency = snapshot.concurrency;
            entry.request_count = snapshot.request_count;
        });

        let events = &self.inner.events;
        publish(
            events,
            TestEvent::Metrics {
                test_id: self.test_id.clone(),
                snapshot,
            },
        );
        publish(
            events,
            TestEvent::Progress {
                test_id: self.test_id.clone(),
                progress: progress.pct,
                phase: progress.phase,
                elapsed: snapshot.elapsed_secs,
                concurrency: snapshot.concurrency,
            },
        );
    }

    async fn finish_exited(&mut self, exit: Result<ExitStatus, EngineError>) {
        if let Err(err) = self.tail.drain(&mut self.accumulator).await {
            tracing::warn!("[{}] Final drain failed: {}", self.test_id, err);
        }
        let code = match &exit {
            Ok(status) => status.code(),
            Err(err) => {
                tracing::warn!("[{}] {}", self.test_id, err);
                None
            }
        };
        let result = Arc::new(aggregate(&self.accumulator, &self.config));
        let status = self.settle(LifecycleEvent::Exited { code }, &result);
        tracing::info!("[{}] Engine exited (code {:?}): {}", self.test_id, code, status);

        match status {
            SessionStatus::Completed => {
                self.persist(SessionStatus::Completed, &result).await;
                self.publish_complete(&result);
            }
            // A stop raced the exit; report it as the stop.
            SessionStatus::Stopped => {
                self.persist(SessionStatus::Stopped, &result).await;
                self.publish_stopped(&result);
            }
            SessionStatus::Failed | SessionStatus::Starting | SessionStatus::Running => {
                self.persist(SessionStatus::Failed, &result).await;
                let diagnostics = self.process.collect_diagnostics().await;
                let error = failure_message(code, &diagnostics);
                publish(
                    &self.inner.events,
                    TestEvent::Error {
                        test_id: self.test_id.clone(),
                        error,
                    },
                );
            }
        }
    }

    async fn finish_stopped(&mut self) {
        let result = Arc::new(aggregate(&self.accumulator, &self.config));
        self.settle(LifecycleEvent::StopRequested, &result);
        tracing::info!("[{}] Stopped by request", self.test_id);
        self.persist(SessionStatus::Stopped, &result).await;
        self.publish_stopped(&result);

        match self
            .process
            .wait_or_kill(self.inner.settings.stop_kill_timeout)
            .await
        {
            Ok(status) => tracing::debug!("[{}] Engine exited after stop: {}", self.test_id, status),
            Err(err) => tracing::warn!("[{}] {}", self.test_id, err),
        }
        let diagnostics = self.process.collect_diagnostics().await;
        if !diagnostics.is_empty() {
            tracing::debug!("[{}] Engine stderr after stop: {}", self.test_id, diagnostics);
        }
    }

    /// Applies the final lifecycle event and stores the result. Returns the
    /// resulting status.
    fn settle(&self, event: LifecycleEvent, result: &Arc<TestResult>) -> SessionStatus {
        self.inner
            .registry
            .with_entry(&self.test_id, |entry| {
                entry.status = transition(entry.status, event);
                entry.result = Some(Arc::clone(result));
                entry.concurrency = 0;
                entry.request_count = result.summary.total_requests;
                entry.finished_elapsed_secs = Some(entry.started_instant.elapsed().as_secs());
                entry.control = None;
                entry.status
            })
            .unwrap_or_else(|| transition(SessionStatus::Running, event))
    }

    async fn persist(&self, status: SessionStatus, result: &TestResult) {
        let record = HistoryRecord::new(&self.test_id, &self.config, status, self.started_at, result);
        if let Err(err) = self.inner.history.save(record).await {
            tracing::error!("[{}] Failed to save history: {}", self.test_id, err);
        }
    }

    fn publish_complete(&self, result: &TestResult) {
        publish(
            &self.inner.events,
            TestEvent::Complete {
                test_id: self.test_id.clone(),
                results: Box::new(result.clone()),
            },
        );
    }

    fn publish_stopped(&self, result: &TestResult) {
        publish(
            &self.inner.events,
            TestEvent::Stopped {
                test_id: self.test_id.clone(),
            },
        );
        self.publish_complete(result);
    }
}

fn failure_message(code: Option<i32>, diagnostics: &str) -> String {
    if !diagnostics.is_empty() {
        return diagnostics.to_owned();
    }
    code.map_or_else(
        || "Load engine was terminated by a signal".to_owned(),
        |code| format!("Load engine exited with code {}", code),
    )
}
