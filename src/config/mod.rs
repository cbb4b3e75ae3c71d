//! Load test configuration files and orchestrator settings.
mod loader;
mod settings;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::load_test_config;
pub use settings::{DEFAULT_ENGINE, OrchestratorSettings, default_history_path, default_work_dir};
pub use types::{AuthSpec, CustomHeader, HttpMethod, LoadTestConfig, SelectedEndpoint, Thresholds};
