use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::plan::LoadProfile;

const DEFAULT_VIRTUAL_USERS: u64 = 10;
const DEFAULT_DURATION_SECS: u64 = 60;
const DEFAULT_RAMP_UP_SECS: u64 = 30;
const DEFAULT_THINK_TIME_SECS: u64 = 1;
const DEFAULT_P95_THRESHOLD_MS: u64 = 3000;
const DEFAULT_MAX_FAILURE_RATE: f64 = 0.15;
const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    #[serde(rename = "GET", alias = "get")]
    Get,
    #[serde(rename = "POST", alias = "post")]
    Post,
    #[serde(rename = "PUT", alias = "put")]
    Put,
    #[serde(rename = "PATCH", alias = "patch")]
    Patch,
    #[serde(rename = "DELETE", alias = "delete")]
    Delete,
    #[serde(rename = "HEAD", alias = "head")]
    Head,
    #[serde(rename = "OPTIONS", alias = "options")]
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether the engine call for this method takes a request body argument.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(ValidationError::UnknownHttpMethod {
                value: value.to_owned(),
            }),
        }
    }
}

/// One endpoint selected for load. `endpoint` is used verbatim as the
/// aggregation key, both in the generated script tags and in reports.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SelectedEndpoint {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(alias = "path", alias = "url")]
    pub endpoint: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthSpec {
    #[default]
    None,
    #[serde(alias = "oauth2", alias = "jwt")]
    Bearer {
        #[serde(alias = "bearerToken")]
        token: String,
    },
    #[serde(alias = "apikey", alias = "api_key")]
    ApiKey {
        #[serde(default = "default_api_key_header", alias = "apiKeyHeader")]
        header: String,
        #[serde(alias = "apiKeyValue")]
        value: String,
    },
    Basic {
        #[serde(alias = "basicUsername")]
        username: String,
        #[serde(alias = "basicPassword")]
        password: String,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomHeader {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Thresholds {
    #[serde(default = "default_p95_threshold_ms")]
    pub p95_ms: u64,
    #[serde(default = "default_max_failure_rate")]
    pub max_failure_rate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_ms: DEFAULT_P95_THRESHOLD_MS,
            max_failure_rate: DEFAULT_MAX_FAILURE_RATE,
        }
    }
}

/// Declarative description of one load test run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoadTestConfig {
    #[serde(default, alias = "testName")]
    pub name: Option<String>,
    #[serde(default, alias = "targetUrl")]
    pub target_url: String,
    #[serde(
        default,
        alias = "selectedApis",
        alias = "selectedEndpoints",
        alias = "selected_endpoints"
    )]
    pub endpoints: Vec<SelectedEndpoint>,
    #[serde(default, alias = "loadProfile")]
    pub load_profile: LoadProfile,
    #[serde(default = "default_virtual_users", alias = "virtualUsers")]
    pub virtual_users: u64,
    #[serde(
        default = "default_duration_secs",
        alias = "duration",
        alias = "durationSec"
    )]
    pub duration_secs: u64,
    #[serde(
        default = "default_ramp_up_secs",
        alias = "rampUpTime",
        alias = "rampUpSec"
    )]
    pub ramp_up_secs: u64,
    #[serde(default = "default_think_time_secs", alias = "thinkTime")]
    pub think_time_secs: u64,
    #[serde(default, alias = "authSpec")]
    pub auth: AuthSpec,
    #[serde(default, alias = "customHeaders")]
    pub custom_headers: Vec<CustomHeader>,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl LoadTestConfig {
    #[must_use]
    pub fn new(target_url: impl Into<String>, endpoints: Vec<SelectedEndpoint>) -> Self {
        Self {
            name: None,
            target_url: target_url.into(),
            endpoints,
            load_profile: LoadProfile::default(),
            virtual_users: DEFAULT_VIRTUAL_USERS,
            duration_secs: DEFAULT_DURATION_SECS,
            ramp_up_secs: DEFAULT_RAMP_UP_SECS,
            think_time_secs: DEFAULT_THINK_TIME_SECS,
            auth: AuthSpec::None,
            custom_headers: Vec::new(),
            thresholds: Thresholds::default(),
        }
    }

    /// Rejects configurations that must never reach the engine.
    ///
    /// # Errors
    ///
    /// Returns an error when no endpoints are selected, the target URL is
    /// missing or malformed, an endpoint is blank, or the duration is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoints.is_empty() {
            return Err(ValidationError::EmptyEndpoints);
        }
        let target = self.target_url.trim();
        if target.is_empty() {
            return Err(ValidationError::MissingTargetUrl);
        }
        let parsed = Url::parse(target).map_err(|err| ValidationError::InvalidTargetUrl {
            value: target.to_owned(),
            source: err,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedTargetScheme {
                scheme: parsed.scheme().to_owned(),
            });
        }
        if let Some(index) = self
            .endpoints
            .iter()
            .position(|endpoint| endpoint.endpoint.trim().is_empty())
        {
            return Err(ValidationError::EmptyEndpoint { index });
        }
        if self.duration_secs == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(())
    }

    #[must_use]
    pub fn display_name(&self, test_id: &str) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("Load Test {}", test_id), str::to_owned)
    }
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_owned()
}

const fn default_virtual_users() -> u64 {
    DEFAULT_VIRTUAL_USERS
}

const fn default_duration_secs() -> u64 {
    DEFAULT_DURATION_SECS
}

const fn default_ramp_up_secs() -> u64 {
    DEFAULT_RAMP_UP_SECS
}

const fn default_think_time_secs() -> u64 {
    DEFAULT_THINK_TIME_SECS
}

const fn default_p95_threshold_ms() -> u64 {
    DEFAULT_P95_THRESHOLD_MS
}

const fn default_max_failure_rate() -> f64 {
    DEFAULT_MAX_FAILURE_RATE
}
