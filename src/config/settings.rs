use std::path::PathBuf;
use std::time::Duration;

/// Engine binary used when none is configured.
pub const DEFAULT_ENGINE: &str = "k6";
/// Interval between reads of the engine output artifact.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Delay before the first poll so the engine can open its output file.
const DEFAULT_INITIAL_POLL_DELAY: Duration = Duration::from_secs(2);
/// Grace period before a finished session and its artifacts are removed.
const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(30);
/// Number of recent samples averaged for live response time.
const DEFAULT_RECENT_WINDOW: usize = 50;
/// Upper bound on captured duration samples per test.
const DEFAULT_MAX_SAMPLES: usize = 1_000_000;
/// How long a capability probe result is trusted.
const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(60);
/// Upper bound on one `<engine> version` run.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Time the engine gets to exit after SIGTERM before it is killed.
const DEFAULT_STOP_KILL_TIMEOUT: Duration = Duration::from_secs(10);
/// Buffered events per subscriber before slow consumers start lagging.
const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub engine: String,
    pub work_dir: PathBuf,
    pub poll_interval: Duration,
    pub initial_poll_delay: Duration,
    pub cleanup_grace: Duration,
    pub recent_window: usize,
    pub max_samples: usize,
    pub probe_ttl: Duration,
    pub probe_timeout: Duration,
    pub stop_kill_timeout: Duration,
    pub event_capacity: usize,
    pub keep_artifacts: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_owned(),
            work_dir: default_work_dir(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_poll_delay: DEFAULT_INITIAL_POLL_DELAY,
            cleanup_grace: DEFAULT_CLEANUP_GRACE,
            recent_window: DEFAULT_RECENT_WINDOW,
            max_samples: DEFAULT_MAX_SAMPLES,
            probe_ttl: DEFAULT_PROBE_TTL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            stop_kill_timeout: DEFAULT_STOP_KILL_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            keep_artifacts: false,
        }
    }
}

#[must_use]
pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("loadpilot").join("scripts")
}

/// `~/.loadpilot/history.json`, or `.loadpilot/history.json` when no home
/// directory is known.
#[must_use]
pub fn default_history_path() -> PathBuf {
    user_home_dir()
        .map_or_else(|| PathBuf::from(".loadpilot"), |home| home.join(".loadpilot"))
        .join("history.json")
}

fn user_home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(value) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(value));
        }
        if let (Some(drive), Some(path)) =
            (std::env::var_os("HOMEDRIVE"), std::env::var_os("HOMEPATH"))
        {
            let mut full = PathBuf::from(drive);
            full.push(path);
            return Some(full);
        }
    }

    std::env::var_os("HOME").map(PathBuf::from)
}
