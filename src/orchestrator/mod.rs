//! Test lifecycle service: starts engine runs, tracks them in an owned
//! registry, and answers stop, status and result queries.
mod artifacts;
mod registry;
mod session;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::config::{LoadTestConfig, OrchestratorSettings};
use crate::engine::{
    EngineCapability, EngineProbe, LifecycleEvent, SessionStatus, spawn_engine, transition,
};
use crate::error::{AppError, AppResult, OrchestratorError};
use crate::events::{EventReceiver, EventSender, TestEvent, event_channel, publish};
use crate::history::{HistoryRecord, HistoryStore};
use crate::metrics::{ArtifactTail, MetricsAccumulator, Phase, finished_progress};
use crate::plan::{build_stages, total_duration_secs};
use crate::report::TestResult;
use crate::script::synthesize_script;

pub use artifacts::SessionArtifacts;
pub use registry::{SessionEntry, TestRegistry};
pub use session::SessionCommand;

use session::SessionDriver;

/// Outcome of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Unknown id, a run that already finished, or a repeated stop.
    NotFound,
}

/// Point-in-time status of a test, live or from history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStatus {
    pub test_id: String,
    pub status: SessionStatus,
    pub progress_pct: u8,
    pub phase: Phase,
    pub elapsed_secs: u64,
    pub concurrency: u64,
    pub request_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<TestResult>,
}

impl TestStatus {
    fn from_entry(test_id: &str, entry: &SessionEntry) -> Self {
        let progress = entry.progress();
        Self {
            test_id: test_id.to_owned(),
            status: entry.status,
            progress_pct: progress.pct,
            phase: progress.phase,
            elapsed_secs: entry.elapsed_secs(),
            concurrency: entry.concurrency,
            request_count: entry.request_count,
            results: entry.result.as_deref().cloned(),
        }
    }

    /// History only holds finished runs, so progress is always complete.
    fn from_record(record: HistoryRecord) -> Self {
        Self {
            test_id: record.id,
            status: record.status,
            progress_pct: finished_progress().pct,
            phase: Phase::Complete,
            elapsed_secs: record.duration_secs,
            concurrency: 0,
            request_count: record.full_results.summary.total_requests,
            results: Some(record.full_results),
        }
    }
}

pub(crate) struct Inner {
    settings: OrchestratorSettings,
    registry: TestRegistry,
    history: Arc<dyn HistoryStore>,
    probe: EngineProbe,
    events: EventSender,
    sequence: AtomicU64,
}

/// Cloneable handle to the orchestration service.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("engine", &self.inner.settings.engine)
            .field("sessions", &self.inner.registry.len())
            .finish()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(settings: OrchestratorSettings, history: Arc<dyn HistoryStore>) -> Self {
        let probe = EngineProbe::new(
            settings.engine.clone(),
            settings.probe_ttl,
            settings.probe_timeout,
        );
        let events = event_channel(settings.event_capacity);
        Self {
            inner: Arc::new(Inner {
                settings,
                registry: TestRegistry::new(),
                history,
                probe,
                events,
                sequence: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn registry(&self) -> &TestRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.inner.history
    }

    /// Subscribes to events of every test started after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub async fn probe(&self) -> EngineCapability {
        self.inner.probe.check().await
    }

    /// Validates a config and renders its script without running anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or cannot be rendered.
    pub fn render_script(&self, config: &LoadTestConfig) -> AppResult<String> {
        config.validate()?;
        let stages = build_stages(
            config.load_profile,
            config.duration_secs,
            config.virtual_users,
            config.ramp_up_secs,
        );
        Ok(synthesize_script(config, &stages)?)
    }

    /// Launches a test and returns its id once the engine is running.
    ///
    /// Invalid configs and a missing engine are rejected before anything is
    /// written or registered. A spawn failure emits an `error` event and
    /// leaves no session behind.
    ///
    /// # Errors
    ///
    /// Returns an error on validation, probe, script or spawn failure.
    pub async fn start_test(&self, config: LoadTestConfig) -> AppResult<String> {
        config.validate()?;
        self.inner.probe.require().await?;

        let stages = build_stages(
            config.load_profile,
            config.duration_secs,
            config.virtual_users,
            config.ramp_up_secs,
        );
        let total_secs = total_duration_secs(&stages);
        let script = synthesize_script(&config, &stages)?;

        let test_id = self.next_test_id();
        let settings = &self.inner.settings;
        let artifacts = SessionArtifacts::new(&settings.work_dir, &test_id);
        artifacts.write_script(&script).await?;

        let config = Arc::new(config);
        let entry = SessionEntry::starting(Arc::clone(&config), total_secs, artifacts.clone());
        let started_at = entry.started_at;
        self.inner.registry.insert(&test_id, entry)?;

        let process = match spawn_engine(
            &settings.engine,
            &artifacts.script_path,
            &artifacts.output_path,
            &test_id,
        ) {
            Ok(process) => process,
            Err(err) => {
                self.inner.registry.with_entry(&test_id, |entry| {
                    entry.status = transition(entry.status, LifecycleEvent::SpawnFailed);
                });
                self.inner.registry.remove(&test_id);
                tracing::error!("[{}] {}", test_id, err);
                publish(
                    &self.inner.events,
                    TestEvent::Error {
                        test_id: test_id.clone(),
                        error: err.to_string(),
                    },
                );
                if !settings.keep_artifacts {
                    artifacts.remove().await;
                }
                return Err(err.into());
            }
        };

        let (control_tx, control_rx) = mpsc::channel(1);
        let pid = process.pid();
        self.inner.registry.with_entry(&test_id, |entry| {
            entry.status = transition(entry.status, LifecycleEvent::Spawned);
            entry.pid = Some(pid);
            entry.control = Some(control_tx);
        });
        publish(
            &self.inner.events,
            TestEvent::Started {
                test_id: test_id.clone(),
                config: Box::new(config.as_ref().clone()),
            },
        );
        tracing::info!(
            "[{}] Running {} against {} ({} stages, {}s)",
            test_id,
            config.load_profile.as_str(),
            config.target_url,
            stages.len(),
            total_secs
        );

        let driver = SessionDriver {
            test_id: test_id.clone(),
            config,
            inner: Arc::clone(&self.inner),
            process,
            control: control_rx,
            tail: ArtifactTail::new(artifacts.output_path.clone()),
            accumulator: MetricsAccumulator::new(settings.recent_window, settings.max_samples),
            total_duration_secs: total_secs,
            started_at,
            artifacts,
        };
        tokio::spawn(driver.run());
        Ok(test_id)
    }

    /// Stops a running test. Only the first stop for an id is honored.
    pub async fn stop_test(&self, test_id: &str) -> StopOutcome {
        let control = self
            .inner
            .registry
            .with_entry(test_id, |entry| {
                if entry.stop_requested || entry.status != SessionStatus::Running {
                    return None;
                }
                entry.stop_requested = true;
                entry.status = transition(entry.status, LifecycleEvent::StopRequested);
                entry.control.clone()
            })
            .flatten();
        let Some(control) = control else {
            return StopOutcome::NotFound;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if control.send(SessionCommand::Stop { ack: ack_tx }).await.is_err() {
            tracing::debug!("[{}] Session already finishing", test_id);
            return StopOutcome::Stopped;
        }
        match ack_rx.await {
            Ok(Ok(())) => tracing::info!("[{}] Stop signal sent", test_id),
            Ok(Err(err)) => tracing::warn!("[{}] Stop signal failed: {}", test_id, err),
            Err(err) => tracing::debug!("[{}] Session closed before ack: {}", test_id, err),
        }
        StopOutcome::Stopped
    }

    /// Stops every test that is still running.
    pub async fn stop_all(&self) -> usize {
        let mut stopped = 0usize;
        for test_id in self.inner.registry.active_ids() {
            if self.stop_test(&test_id).await == StopOutcome::Stopped {
                stopped = stopped.saturating_add(1);
            }
        }
        stopped
    }

    /// Live status, or the history record once the session is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or history cannot be read.
    pub async fn get_status(&self, test_id: &str) -> AppResult<TestStatus> {
        if let Some(status) = self
            .inner
            .registry
            .with_entry(test_id, |entry| TestStatus::from_entry(test_id, entry))
        {
            return Ok(status);
        }
        let record = self.inner.history.get(test_id).await?;
        record
            .map(TestStatus::from_record)
            .ok_or_else(|| not_found(test_id))
    }

    /// Final result of a finished test.
    ///
    /// # Errors
    ///
    /// Returns an error if no result exists for the id or history cannot be
    /// read.
    pub async fn get_result(&self, test_id: &str) -> AppResult<TestResult> {
        if let Some(Some(result)) = self
            .inner
            .registry
            .with_entry(test_id, |entry| entry.result.as_deref().cloned())
        {
            return Ok(result);
        }
        let record = self.inner.history.get(test_id).await?;
        record
            .map(|record| record.full_results)
            .ok_or_else(|| not_found(test_id))
    }

    /// `lt-<millis>-<pid>-<seq>`: unique across processes sharing a work
    /// dir and history file.
    fn next_test_id(&self) -> String {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "lt-{}-{}-{}",
            Utc::now().timestamp_millis(),
            std::process::id(),
            sequence
        )
    }
}

fn not_found(test_id: &str) -> AppError {
    OrchestratorError::TestNotFound {
        test_id: test_id.to_owned(),
    }
    .into()
}
