use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::LoadTestConfig;
use crate::engine::SessionStatus;
use crate::error::OrchestratorError;
use crate::metrics::{Progress, live_progress};
use crate::report::TestResult;

use super::artifacts::SessionArtifacts;
use super::session::SessionCommand;

/// Registry view of one active or recently finished test.
#[derive(Debug)]
pub struct SessionEntry {
    pub config: Arc<LoadTestConfig>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub started_instant: Instant,
    pub total_duration_secs: u64,
    pub ramp_up_secs: u64,
    pub pid: Option<u32>,
    pub concurrency: u64,
    pub request_count: u64,
    /// Wall-clock seconds, frozen once the session is terminal.
    pub finished_elapsed_secs: Option<u64>,
    pub stop_requested: bool,
    pub control: Option<mpsc::Sender<SessionCommand>>,
    pub result: Option<Arc<TestResult>>,
    pub artifacts: SessionArtifacts,
}

impl SessionEntry {
    pub(super) fn starting(
        config: Arc<LoadTestConfig>,
        total_duration_secs: u64,
        artifacts: SessionArtifacts,
    ) -> Self {
        let ramp_up_secs = config.ramp_up_secs;
        Self {
            config,
            status: SessionStatus::Starting,
            started_at: Utc::now(),
            started_instant: Instant::now(),
            total_duration_secs,
            ramp_up_secs,
            pid: None,
            concurrency: 0,
            request_count: 0,
            finished_elapsed_secs: None,
            stop_requested: false,
            control: None,
            result: None,
            artifacts,
        }
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.finished_elapsed_secs
            .unwrap_or_else(|| self.started_instant.elapsed().as_secs())
    }

    /// Wall-clock progress. 100 is reserved for a completed run.
    #[must_use]
    pub fn progress(&self) -> Progress {
        if self.status == SessionStatus::Completed {
            return crate::metrics::finished_progress();
        }
        live_progress(
            self.elapsed_secs(),
            self.total_duration_secs,
            self.ramp_up_secs,
        )
    }
}

/// Owned map of test id to session. One entry per id at a time.
#[derive(Debug, Default)]
pub struct TestRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl TestRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// # Errors
    ///
    /// Returns an error if the id is already registered.
    pub fn insert(&self, test_id: &str, entry: SessionEntry) -> Result<(), OrchestratorError> {
        let mut sessions = self.sessions();
        if sessions.contains_key(test_id) {
            return Err(OrchestratorError::DuplicateTestId {
                test_id: test_id.to_owned(),
            });
        }
        sessions.insert(test_id.to_owned(), entry);
        Ok(())
    }

    /// Runs `f` against the entry under the registry lock.
    pub fn with_entry<R>(&self, test_id: &str, f: impl FnOnce(&mut SessionEntry) -> R) -> Option<R> {
        self.sessions().get_mut(test_id).map(f)
    }

    pub fn remove(&self, test_id: &str) -> Option<SessionEntry> {
        self.sessions().remove(test_id)
    }

    #[must_use]
    pub fn contains(&self, test_id: &str) -> bool {
        self.sessions().contains_key(test_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Ids of sessions that have not reached a terminal state.
    #[must_use]
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions()
            .iter()
            .filter(|(_, entry)| !entry.status.is_terminal())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }
}
