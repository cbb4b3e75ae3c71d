use super::*;
use crate::config::{AuthSpec, CustomHeader, HttpMethod, LoadTestConfig, SelectedEndpoint};
use crate::plan::{LoadProfile, build_stages};

fn endpoint(method: HttpMethod, path: &str) -> SelectedEndpoint {
    SelectedEndpoint {
        method,
        endpoint: path.to_owned(),
        description: None,
        body: None,
    }
}

fn sample_config() -> LoadTestConfig {
    let mut checkout = endpoint(HttpMethod::Post, "/api/checkout");
    checkout.body = Some(serde_json::json!({ "sku": "A1", "qty": 2 }));
    checkout.description = Some("Place order".to_owned());
    let mut config = LoadTestConfig::new(
        "https://shop.example.com/",
        vec![
            endpoint(HttpMethod::Get, "/api/cart"),
            checkout,
            endpoint(HttpMethod::Get, "https://cdn.example.com/it's.js"),
        ],
    );
    config.auth = AuthSpec::Bearer {
        token: "tok".to_owned(),
    };
    config.custom_headers = vec![CustomHeader {
        key: "X-Trace".to_owned(),
        value: "on".to_owned(),
    }];
    config.virtual_users = 10;
    config.duration_secs = 30;
    config.ramp_up_secs = 5;
    config.load_profile = LoadProfile::Constant;
    config
}

fn render(config: &LoadTestConfig) -> Result<String, String> {
    let stages = build_stages(
        config.load_profile,
        config.duration_secs,
        config.virtual_users,
        config.ramp_up_secs,
    );
    synthesize_script(config, &stages).map_err(|err| err.to_string())
}

#[test]
fn script_is_byte_identical_for_identical_input() -> Result<(), String> {
    let config = sample_config();
    let first = render(&config)?;
    for _ in 0..5 {
        if render(&config.clone())? != first {
            return Err("Script output changed between runs".to_owned());
        }
    }
    Ok(())
}

#[test]
fn script_embeds_stages_and_thresholds() -> Result<(), String> {
    let script = render(&sample_config())?;
    let expected = [
        "{ duration: '5s', target: 10 },",
        "{ duration: '25s', target: 10 },",
        "http_req_duration: ['p(95)<3000'],",
        "http_req_failed: ['rate<0.15'],",
        "sleep(1);",
        "const errorRate = new Rate('errors');",
    ];
    for needle in expected {
        if !script.contains(needle) {
            return Err(format!("Missing '{}' in script:\n{}", needle, script));
        }
    }
    Ok(())
}

#[test]
fn script_tags_each_request_with_literal_endpoint() -> Result<(), String> {
    let script = render(&sample_config())?;
    let expected = [
        "http.get(\"https://shop.example.com/api/cart\", { headers: headers, tags: { endpoint: \"/api/cart\" } })",
        "http.post(\"https://shop.example.com/api/checkout\", \"{\\\"qty\\\":2,\\\"sku\\\":\\\"A1\\\"}\", { headers: headers, tags: { endpoint: \"/api/checkout\" } })",
        "tags: { endpoint: \"https://cdn.example.com/it's.js\" }",
        "// Place order",
        "// GET /api/cart",
    ];
    for needle in expected {
        if !script.contains(needle) {
            return Err(format!("Missing '{}' in script:\n{}", needle, script));
        }
    }
    Ok(())
}

#[test]
fn script_headers_merge_auth_and_custom() -> Result<(), String> {
    let script = render(&sample_config())?;
    let expected = "const headers = {\n    \"Authorization\": \"Bearer tok\",\n    \"X-Trace\": \"on\"\n};";
    if !script.contains(expected) {
        return Err(format!("Unexpected headers block:\n{}", script));
    }
    Ok(())
}

#[test]
fn script_without_headers_renders_empty_object() -> Result<(), String> {
    let mut config = sample_config();
    config.auth = AuthSpec::None;
    config.custom_headers.clear();
    let script = render(&config)?;
    if !script.contains("const headers = {};") {
        return Err(format!("Unexpected headers block:\n{}", script));
    }
    Ok(())
}

#[test]
fn body_is_ignored_for_methods_without_payload() -> Result<(), String> {
    let mut config = sample_config();
    let mut delete = endpoint(HttpMethod::Delete, "/api/cart/1");
    delete.body = Some(serde_json::json!({ "ignored": true }));
    config.endpoints = vec![delete];
    let script = render(&config)?;
    if !script.contains("http.del(\"https://shop.example.com/api/cart/1\", null, {") {
        return Err(format!("Unexpected delete call:\n{}", script));
    }
    if script.contains("ignored") {
        return Err("Body leaked into DELETE request".to_owned());
    }
    Ok(())
}
