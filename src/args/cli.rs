use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use loadpilot::config::{
    AuthSpec, CustomHeader, DEFAULT_ENGINE, LoadTestConfig, SelectedEndpoint, load_test_config,
};
use loadpilot::error::AppResult;
use loadpilot::history::DEFAULT_LIST_LIMIT;
use loadpilot::plan::LoadProfile;

use super::parsers::{parse_endpoint, parse_header};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Load test orchestrator - generates engine scripts, runs the load engine, streams live metrics, and keeps a history of reports."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Load engine binary (k6 compatible)
    #[arg(long = "engine", env = "LOADPILOT_ENGINE", default_value = DEFAULT_ENGINE, global = true)]
    pub engine: String,

    /// Directory for generated scripts and engine output
    #[arg(long = "work-dir", env = "LOADPILOT_WORK_DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// History file (defaults to ~/.loadpilot/history.json)
    #[arg(long = "history", env = "LOADPILOT_HISTORY", global = true)]
    pub history: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a load test and follow it until it finishes
    Run(RunArgs),
    /// Print the generated engine script without running it
    Script(ScriptArgs),
    /// Check whether the load engine is installed
    Probe,
    /// List recent test runs
    History(HistoryArgs),
    /// Show the stored report of one run
    Show(ShowArgs),
}

/// Test definition, from a config file and/or flags. Flags override file
/// values and endpoints are appended.
#[derive(Debug, Args, Clone)]
pub struct TestArgs {
    /// Test config file (.toml or .json)
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Test name shown in history
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Target base URL
    #[arg(long = "url", short = 'u')]
    pub url: Option<String>,

    /// Endpoint to load, '/path' or 'METHOD /path' (repeatable)
    #[arg(long = "endpoint", short = 'e', value_parser = parse_endpoint)]
    pub endpoints: Vec<SelectedEndpoint>,

    /// Load profile: constant, ramp-up, spike, stress, soak
    #[arg(long = "profile", short = 'p')]
    pub profile: Option<LoadProfile>,

    /// Target virtual users
    #[arg(long = "users")]
    pub users: Option<u64>,

    /// Test duration in seconds
    #[arg(long = "duration", short = 'd')]
    pub duration: Option<u64>,

    /// Ramp-up time in seconds
    #[arg(long = "ramp-up")]
    pub ramp_up: Option<u64>,

    /// Pause between iterations in seconds
    #[arg(long = "think-time")]
    pub think_time: Option<u64>,

    /// Extra header 'Key: Value' (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Bearer token sent as Authorization
    #[arg(long = "bearer", env = "LOADPILOT_BEARER_TOKEN", hide_env_values = true)]
    pub bearer: Option<String>,
}

impl TestArgs {
    /// Builds the test config: file first, then flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn into_config(self) -> AppResult<LoadTestConfig> {
        let mut config = self
            .config
            .as_deref()
            .map(load_test_config)
            .transpose()?
            .unwrap_or_else(|| LoadTestConfig::new(String::new(), Vec::new()));
        if let Some(name) = self.name {
            config.name = Some(name);
        }
        if let Some(url) = self.url {
            config.target_url = url;
        }
        config.endpoints.extend(self.endpoints);
        if let Some(profile) = self.profile {
            config.load_profile = profile;
        }
        if let Some(users) = self.users {
            config.virtual_users = users;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(ramp_up) = self.ramp_up {
            config.ramp_up_secs = ramp_up;
        }
        if let Some(think_time) = self.think_time {
            config.think_time_secs = think_time;
        }
        config.custom_headers.extend(
            self.headers
                .into_iter()
                .map(|(key, value)| CustomHeader { key, value }),
        );
        if let Some(token) = self.bearer {
            config.auth = AuthSpec::Bearer { token };
        }
        Ok(config)
    }
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub test: TestArgs,

    /// Keep the generated script and engine output after the run
    #[arg(long = "keep-artifacts")]
    pub keep_artifacts: bool,

    /// Print the final report as JSON instead of a summary
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub test: TestArgs,

    /// Write the script to this file instead of stdout
    #[arg(long = "out", short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Maximum number of runs to list
    #[arg(long = "limit", short = 'n', default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Test id as printed by `run` or `history`
    pub id: String,

    /// Print the full report as JSON
    #[arg(long = "json")]
    pub json: bool,
}
