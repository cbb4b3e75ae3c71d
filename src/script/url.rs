/// Joins a relative endpoint onto the target base URL. Absolute endpoints
/// pass through untouched.
#[must_use]
pub fn resolve_url(endpoint: &str, target_url: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_owned();
    }
    let base = target_url.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    }
}
