//! External load engine: capability probing, process supervision and the
//! run lifecycle.
mod lifecycle;
mod probe;
mod supervisor;


pub use lifecycle::{LifecycleEvent, SessionStatus, transition};
pub use probe::{EngineCapability, EngineProbe, INSTALL_HINT};
pub use supervisor::{EngineProcess, signal_terminate, spawn_engine};
