use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::EngineError;

/// Remediation shown when the engine binary is missing.
pub const INSTALL_HINT: &str =
    "Install k6 (https://k6.io/docs/get-started/installation/) or point --engine at a compatible binary.";

/// Result of asking the engine binary for its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineCapability {
    pub available: bool,
    pub version: Option<String>,
}

/// Cached capability probe. A result is reused until it is older than the
/// configured TTL, after which the next check runs the engine again. A
/// version command that outlives `timeout` is killed and counts as missing.
#[derive(Debug)]
pub struct EngineProbe {
    engine: String,
    ttl: Duration,
    timeout: Duration,
    cached: Mutex<Option<(Instant, EngineCapability)>>,
}

impl EngineProbe {
    #[must_use]
    pub fn new(engine: impl Into<String>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            engine: engine.into(),
            ttl,
            timeout,
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub async fn check(&self) -> EngineCapability {
        let mut cached = self.cached.lock().await;
        if let Some((checked_at, capability)) = cached.as_ref()
            && checked_at.elapsed() < self.ttl
        {
            return capability.clone();
        }
        let capability = run_version(&self.engine, self.timeout).await;
        tracing::debug!(
            "Engine probe for '{}': available={} version={:?}",
            self.engine,
            capability.available,
            capability.version
        );
        *cached = Some((Instant::now(), capability.clone()));
        capability
    }

    /// Like [`EngineProbe::check`] but fails when the engine is missing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] with an install hint.
    pub async fn require(&self) -> Result<EngineCapability, EngineError> {
        let capability = self.check().await;
        if capability.available {
            Ok(capability)
        } else {
            Err(EngineError::Unavailable {
                engine: self.engine.clone(),
                hint: INSTALL_HINT,
            })
        }
    }
}

async fn run_version(engine: &str, timeout: Duration) -> EngineCapability {
    let command = Command::new(engine)
        .arg("version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();
    let output = match tokio::time::timeout(timeout, command).await {
        Ok(output) => output,
        Err(elapsed) => {
            tracing::warn!(
                "Engine '{}' did not answer 'version' within {:?}: {}",
                engine,
                timeout,
                elapsed
            );
            return EngineCapability {
                available: false,
                version: None,
            };
        }
    };
    match output {
        Ok(output) if output.status.success() => EngineCapability {
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_owned),
        },
        Ok(_) | Err(_) => EngineCapability {
            available: false,
            version: None,
        },
    }
}
