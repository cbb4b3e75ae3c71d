use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("A test with id '{test_id}' is already active.")]
    DuplicateTestId { test_id: String },
    #[error("No test with id '{test_id}' is active or recorded.")]
    TestNotFound { test_id: String },
    #[error("Test '{test_id}' failed: {message}")]
    RunFailed { test_id: String, message: String },
}
