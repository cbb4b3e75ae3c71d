use serde::{Deserialize, Serialize};

/// Lifecycle of one engine run.
///
/// `Starting -> Running -> {Completed | Failed | Stopped}`, plus
/// `Starting -> Failed` when the engine never launched. Terminal states are
/// absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Stopped
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the lifecycle reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Spawned,
    SpawnFailed,
    /// The engine exited. `None` means it was terminated by a signal.
    Exited { code: Option<i32> },
    StopRequested,
}

/// Applies one event to a status. Events that do not apply in the current
/// state leave it unchanged.
#[must_use]
pub const fn transition(status: SessionStatus, event: LifecycleEvent) -> SessionStatus {
    match (status, event) {
        (SessionStatus::Starting, LifecycleEvent::Spawned) => SessionStatus::Running,
        (SessionStatus::Starting, LifecycleEvent::SpawnFailed) => SessionStatus::Failed,
        (SessionStatus::Running, LifecycleEvent::Exited { code: Some(0) }) => {
            SessionStatus::Completed
        }
        (SessionStatus::Running, LifecycleEvent::Exited { .. }) => SessionStatus::Failed,
        (SessionStatus::Running, LifecycleEvent::StopRequested) => SessionStatus::Stopped,
        (
            SessionStatus::Starting,
            LifecycleEvent::Exited { .. } | LifecycleEvent::StopRequested,
        )
        | (SessionStatus::Running, LifecycleEvent::Spawned | LifecycleEvent::SpawnFailed)
        | (
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Stopped,
            LifecycleEvent::Spawned
            | LifecycleEvent::SpawnFailed
            | LifecycleEvent::Exited { .. }
            | LifecycleEvent::StopRequested,
        ) => status,
    }
}
