//! Core library for the `loadpilot` CLI.
//!
//! Turns a declarative load test configuration into a script for an
//! external k6-compatible engine, supervises the engine process, tails its
//! JSON lines output into live metrics, and aggregates a final report that
//! is kept in a history store. The [`orchestrator::Orchestrator`] service is
//! the entry point; the other modules are its building blocks.
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod logger;
pub mod metrics;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod script;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
