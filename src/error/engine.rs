use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Load engine '{engine}' is not installed or not on PATH. {hint}")]
    Unavailable { engine: String, hint: &'static str },
    #[error("Failed to create work directory '{path}': {source}")]
    CreateWorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write engine script '{path}': {source}")]
    WriteScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn load engine '{engine}': {source}")]
    Spawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Load engine exited without a process id.")]
    MissingPid,
    #[error("Failed to signal load engine process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to wait for load engine: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}
