use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// On-disk files of one test: the generated script and the engine's
/// JSON lines output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArtifacts {
    pub script_path: PathBuf,
    pub output_path: PathBuf,
}

impl SessionArtifacts {
    #[must_use]
    pub fn new(work_dir: &Path, test_id: &str) -> Self {
        Self {
            script_path: work_dir.join(format!("k6-test-{}.js", test_id)),
            output_path: work_dir.join(format!("k6-output-{}.jsonl", test_id)),
        }
    }

    /// Writes the script, creating the work directory on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the script cannot be written.
    pub async fn write_script(&self, script: &str) -> Result<(), EngineError> {
        if let Some(dir) = self.script_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|err| EngineError::CreateWorkDir {
                    path: dir.to_path_buf(),
                    source: err,
                })?;
        }
        tokio::fs::write(&self.script_path, script)
            .await
            .map_err(|err| EngineError::WriteScript {
                path: self.script_path.clone(),
                source: err,
            })
    }

    /// Removes both files. Missing files are fine.
    pub async fn remove(&self) {
        for path in [&self.script_path, &self.output_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!("Failed to remove artifact '{}': {}", path.display(), err);
                }
            }
        }
    }
}
