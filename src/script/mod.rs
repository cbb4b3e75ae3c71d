//! Engine script synthesis.
//!
//! The generated script is a k6-compatible module. Every request is tagged
//! with [`ENDPOINT_TAG`] set to the literal endpoint string from the config,
//! which is the key the metrics parser slices per-endpoint samples by.
mod auth;
mod url;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::config::{HttpMethod, LoadTestConfig, SelectedEndpoint};
use crate::error::ScriptError;
use crate::plan::Stage;

pub use auth::merge_headers;
pub use url::resolve_url;

/// Tag carrying the endpoint key on every engine sample.
pub const ENDPOINT_TAG: &str = "endpoint";
/// Indentation used for JSON literals embedded in the script.
const JSON_INDENT: &[u8] = b"    ";

/// Renders the engine script for a config and its planned stages.
///
/// The output depends only on the inputs: identical inputs yield
/// byte-identical scripts.
///
/// # Errors
///
/// Returns an error if an embedded JSON literal cannot be encoded.
pub fn synthesize_script(config: &LoadTestConfig, stages: &[Stage]) -> Result<String, ScriptError> {
    let headers = merge_headers(&config.auth, &config.custom_headers);
    let mut out = String::new();

    writeln!(out, "import http from 'k6/http';")?;
    writeln!(out, "import {{ check, sleep }} from 'k6';")?;
    writeln!(out, "import {{ Rate, Trend }} from 'k6/metrics';")?;
    writeln!(out)?;
    writeln!(out, "const errorRate = new Rate('errors');")?;
    writeln!(out, "const apiResponseTime = new Trend('api_response_time');")?;
    writeln!(out)?;
    writeln!(out, "export const options = {{")?;
    writeln!(out, "    stages: [")?;
    for stage in stages {
        writeln!(
            out,
            "        {{ duration: '{}s', target: {} }},",
            stage.duration_secs, stage.target
        )?;
    }
    writeln!(out, "    ],")?;
    writeln!(out, "    thresholds: {{")?;
    writeln!(
        out,
        "        http_req_duration: ['p(95)<{}'],",
        config.thresholds.p95_ms
    )?;
    writeln!(
        out,
        "        http_req_failed: ['rate<{}'],",
        config.thresholds.max_failure_rate
    )?;
    writeln!(out, "    }},")?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "const headers = {};", pretty_json(&headers)?)?;
    writeln!(out)?;
    writeln!(out, "export default function () {{")?;
    for endpoint in &config.endpoints {
        write_request_block(&mut out, endpoint, &config.target_url)?;
    }
    writeln!(out)?;
    writeln!(out, "    sleep({});", config.think_time_secs)?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "export function handleSummary(data) {{")?;
    writeln!(out, "    return {{ stdout: JSON.stringify(data) }};")?;
    writeln!(out, "}}")?;

    Ok(out)
}

fn write_request_block(
    out: &mut String,
    endpoint: &SelectedEndpoint,
    target_url: &str,
) -> Result<(), ScriptError> {
    let url = js_string(&resolve_url(&endpoint.endpoint, target_url), "endpoint url")?;
    let key = js_string(&endpoint.endpoint, "endpoint tag")?;
    let check_name = js_string(&format!("{} status 2xx", endpoint.endpoint), "check name")?;
    let params = format!("{{ headers: headers, tags: {{ {}: {} }} }}", ENDPOINT_TAG, key);
    let body = request_body(endpoint)?;

    let call = match endpoint.method {
        HttpMethod::Get => format!("http.get({}, {})", url, params),
        HttpMethod::Head => format!("http.head({}, {})", url, params),
        HttpMethod::Post => format!("http.post({}, {}, {})", url, body, params),
        HttpMethod::Put => format!("http.put({}, {}, {})", url, body, params),
        HttpMethod::Patch => format!("http.patch({}, {}, {})", url, body, params),
        HttpMethod::Delete => format!("http.del({}, null, {})", url, params),
        HttpMethod::Options => format!("http.options({}, null, {})", url, params),
    };

    let label = endpoint
        .description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map_or_else(
            || format!("{} {}", endpoint.method, endpoint.endpoint),
            str::to_owned,
        );

    writeln!(out)?;
    writeln!(out, "    // {}", single_line(&label))?;
    writeln!(out, "    {{")?;
    writeln!(out, "        const res = {};", call)?;
    writeln!(out, "        check(res, {{")?;
    writeln!(
        out,
        "            {}: (r) => r.status >= 200 && r.status < 400,",
        check_name
    )?;
    writeln!(out, "        }});")?;
    writeln!(out, "        errorRate.add(res.status >= 400);")?;
    writeln!(out, "        apiResponseTime.add(res.timings.duration);")?;
    writeln!(out, "    }}")?;
    Ok(())
}

/// JS literal for the request body: the JSON text of the body as a string,
/// or `null` when there is no body.
fn request_body(endpoint: &SelectedEndpoint) -> Result<String, ScriptError> {
    if !endpoint.method.carries_body() {
        return Ok("null".to_owned());
    }
    let Some(body) = endpoint.body.as_ref() else {
        return Ok("null".to_owned());
    };
    let text = serde_json::to_string(body).map_err(|err| ScriptError::Encode {
        context: "request body",
        source: err,
    })?;
    js_string(&text, "request body")
}

fn js_string(value: &str, context: &'static str) -> Result<String, ScriptError> {
    serde_json::to_string(value).map_err(|err| ScriptError::Encode {
        context,
        source: err,
    })
}

fn pretty_json(headers: &BTreeMap<String, String>) -> Result<String, ScriptError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    headers
        .serialize(&mut serializer)
        .map_err(|err| ScriptError::Encode {
            context: "headers",
            source: err,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
