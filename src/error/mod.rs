mod app;
mod config;
mod engine;
mod history;
mod metrics;
mod orchestrator;
mod script;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use engine::EngineError;
pub use history::HistoryError;
pub use metrics::MetricsError;
pub use orchestrator::OrchestratorError;
pub use script::ScriptError;
pub use validation::ValidationError;
