use super::{AuthSpec, HttpMethod, LoadTestConfig, SelectedEndpoint, load_test_config};
use crate::error::{AppError, ConfigError, ValidationError};
use crate::plan::LoadProfile;
use tempfile::tempdir;

fn endpoint(path: &str) -> SelectedEndpoint {
    SelectedEndpoint {
        method: HttpMethod::Get,
        endpoint: path.to_owned(),
        description: None,
        body: None,
    }
}

#[test]
fn parse_toml_config_with_endpoints_and_auth() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadtest.toml");
    let content = r#"
name = "checkout"
target_url = "https://shop.example.com/"
load_profile = "ramp-up"
virtual_users = 25
duration_secs = 120
ramp_up_secs = 20

[auth]
type = "api-key"
value = "secret"

[[endpoints]]
method = "get"
endpoint = "/api/cart"

[[endpoints]]
method = "POST"
endpoint = "/api/checkout"
body = { sku = "A1", qty = 2 }

[[custom_headers]]
key = "X-Trace"
value = "on"
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_test_config(&path).map_err(|err| err.to_string())?;
    if config.name.as_deref() != Some("checkout") {
        return Err("Unexpected name".to_owned());
    }
    if config.load_profile != LoadProfile::RampUp {
        return Err(format!("Unexpected profile: {:?}", config.load_profile));
    }
    if config.endpoints.len() != 2 {
        return Err(format!("Unexpected endpoints: {}", config.endpoints.len()));
    }
    let second = config
        .endpoints
        .get(1)
        .ok_or_else(|| "Missing second endpoint".to_owned())?;
    if second.method != HttpMethod::Post || second.body.is_none() {
        return Err("Expected POST endpoint with body".to_owned());
    }
    match &config.auth {
        AuthSpec::ApiKey { header, value } if header == "X-API-Key" && value == "secret" => {}
        other => return Err(format!("Unexpected auth: {:?}", other)),
    }
    if config.think_time_secs != 1 {
        return Err("Expected default think time".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config_with_camel_case_field_names() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadtest.json");
    let content = r#"{
  "targetUrl": "http://localhost:3000",
  "selectedApis": [
    { "method": "GET", "endpoint": "/health", "description": "Health" }
  ],
  "loadProfile": "rampup",
  "virtualUsers": 5,
  "duration": 30,
  "rampUpTime": 5,
  "authSpec": { "type": "jwt", "bearerToken": "abc" },
  "customHeaders": [ { "key": "X-Env", "value": "qa" } ]
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_test_config(&path).map_err(|err| err.to_string())?;
    if config.target_url != "http://localhost:3000" {
        return Err("Unexpected target url".to_owned());
    }
    if config.virtual_users != 5 || config.duration_secs != 30 || config.ramp_up_secs != 5 {
        return Err("Unexpected load numbers".to_owned());
    }
    if config.load_profile != LoadProfile::RampUp {
        return Err("Expected rampup alias to map to ramp-up".to_owned());
    }
    if config.auth != (AuthSpec::Bearer { token: "abc".to_owned() }) {
        return Err(format!("Unexpected auth: {:?}", config.auth));
    }
    Ok(())
}

#[test]
fn load_config_rejects_unknown_extension() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadtest.yaml");
    std::fs::write(&path, "x: 1").map_err(|err| format!("write failed: {}", err))?;

    match load_test_config(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other)),
    }
}

#[test]
fn validate_rejects_empty_endpoints_first() -> Result<(), String> {
    let config = LoadTestConfig::new("", Vec::new());
    match config.validate() {
        Err(ValidationError::EmptyEndpoints) => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other)),
    }
}

#[test]
fn validate_rejects_missing_target_url() -> Result<(), String> {
    let config = LoadTestConfig::new("   ", vec![endpoint("/a")]);
    match config.validate() {
        Err(ValidationError::MissingTargetUrl) => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other)),
    }
}

#[test]
fn validate_rejects_non_http_scheme() -> Result<(), String> {
    let config = LoadTestConfig::new("ftp://files.example.com", vec![endpoint("/a")]);
    match config.validate() {
        Err(ValidationError::UnsupportedTargetScheme { scheme }) if scheme == "ftp" => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other)),
    }
}

#[test]
fn validate_rejects_blank_endpoint() -> Result<(), String> {
    let config = LoadTestConfig::new("http://localhost", vec![endpoint("/a"), endpoint(" ")]);
    match config.validate() {
        Err(ValidationError::EmptyEndpoint { index: 1 }) => Ok(()),
        other => Err(format!("Unexpected result: {:?}", other)),
    }
}

#[test]
fn display_name_falls_back_to_test_id() -> Result<(), String> {
    let mut config = LoadTestConfig::new("http://localhost", vec![endpoint("/a")]);
    if config.display_name("lt-1") != "Load Test lt-1" {
        return Err("Unexpected default name".to_owned());
    }
    config.name = Some("nightly".to_owned());
    if config.display_name("lt-1") != "nightly" {
        return Err("Expected configured name".to_owned());
    }
    Ok(())
}

#[test]
fn http_method_from_str_is_case_insensitive() -> Result<(), String> {
    let parsed: HttpMethod = "patch"
        .parse()
        .map_err(|err| format!("parse failed: {}", err))?;
    if parsed != HttpMethod::Patch {
        return Err(format!("Unexpected method: {:?}", parsed));
    }
    match "FETCH".parse::<HttpMethod>() {
        Err(ValidationError::UnknownHttpMethod { value }) if value == "FETCH" => Ok(()),
        other => Err(format!("Unexpected parse result: {:?}", other)),
    }
}
