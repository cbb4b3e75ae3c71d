use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::EngineError;

/// Captured stderr is truncated to this many bytes.
const MAX_STDERR_BYTES: u64 = 65_536;

/// A launched engine subprocess with its output pumps.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    pid: u32,
    stdout_pump: Option<JoinHandle<()>>,
    stderr_pump: Option<JoinHandle<String>>,
}

/// Launches `<engine> run --out json=<output> <script>`.
///
/// Stdout lines are logged at debug level and stderr is collected for the
/// failure report.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or reports no pid.
pub fn spawn_engine(
    engine: &str,
    script_path: &Path,
    output_path: &Path,
    test_id: &str,
) -> Result<EngineProcess, EngineError> {
    let mut command = Command::new(engine);
    command
        .arg("run")
        .arg("--out")
        .arg(format!("json={}", output_path.display()))
        .arg(script_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|err| EngineError::Spawn {
        engine: engine.to_owned(),
        source: err,
    })?;
    let Some(pid) = child.id() else {
        return Err(EngineError::MissingPid);
    };

    let stdout_pump = child.stdout.take().map(|stdout| {
        let test_id = test_id.to_owned();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("[{}] engine: {}", test_id, line);
            }
        })
    });
    let stderr_pump = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut captured = Vec::new();
            let mut limited = stderr.take(MAX_STDERR_BYTES);
            if let Err(err) = limited.read_to_end(&mut captured).await {
                tracing::debug!("Failed to read engine stderr: {}", err);
            }
            // Keep draining so the engine never blocks on a full pipe.
            let mut rest = limited.into_inner();
            if let Err(err) = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await {
                tracing::debug!("Failed to drain engine stderr: {}", err);
            }
            String::from_utf8_lossy(&captured).trim().to_owned()
        })
    });

    tracing::info!("Started engine for {} (pid {})", test_id, pid);
    Ok(EngineProcess {
        child,
        pid,
        stdout_pump,
        stderr_pump,
    })
}

impl EngineProcess {
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Waits for the engine to exit. Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the exit status cannot be collected.
    pub async fn wait(&mut self) -> Result<ExitStatus, EngineError> {
        self.child
            .wait()
            .await
            .map_err(|err| EngineError::Wait { source: err })
    }

    /// Waits up to `timeout` for the engine to exit, then kills it.
    ///
    /// # Errors
    ///
    /// Returns an error if the exit status cannot be collected.
    pub async fn wait_or_kill(&mut self, timeout: Duration) -> Result<ExitStatus, EngineError> {
        if let Ok(status) = tokio::time::timeout(timeout, self.child.wait()).await {
            return status.map_err(|err| EngineError::Wait { source: err });
        }
        tracing::warn!(
            "Engine pid {} ignored termination for {:?}; killing it.",
            self.pid,
            timeout
        );
        if let Err(err) = self.child.start_kill() {
            tracing::warn!("Failed to kill engine pid {}: {}", self.pid, err);
        }
        self.wait().await
    }

    /// Sends the platform termination signal to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered.
    pub fn terminate(&self) -> Result<(), EngineError> {
        signal_terminate(self.pid)
    }

    /// Collects diagnostics after exit: the captured stderr text. Later
    /// calls return an empty string.
    pub async fn collect_diagnostics(&mut self) -> String {
        if let Some(pump) = self.stdout_pump.take()
            && let Err(err) = pump.await
        {
            tracing::debug!("Engine stdout pump failed: {}", err);
        }
        let Some(pump) = self.stderr_pump.take() else {
            return String::new();
        };
        pump.await.unwrap_or_default()
    }
}

/// Asks the process to terminate: SIGTERM on unix, a forced process-tree
/// kill on Windows.
///
/// # Errors
///
/// Returns an error if the signal cannot be sent.
#[cfg(unix)]
pub fn signal_terminate(pid: u32) -> Result<(), EngineError> {
    let raw_pid = libc::pid_t::try_from(pid).map_err(|err| EngineError::Signal {
        pid,
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, err),
    })?;
    // SAFETY: kill(2) takes plain integers and touches no memory we own. The
    // pid belongs to a child that has not been reaped yet.
    let rc = unsafe { libc::kill(raw_pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(EngineError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}

/// Asks the process to terminate: SIGTERM on unix, a forced process-tree
/// kill on Windows.
///
/// # Errors
///
/// Returns an error if `taskkill` cannot be launched.
#[cfg(windows)]
pub fn signal_terminate(pid: u32) -> Result<(), EngineError> {
    std::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|err| EngineError::Signal { pid, source: err })
}
