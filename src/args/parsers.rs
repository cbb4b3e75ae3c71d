use loadpilot::config::{HttpMethod, SelectedEndpoint};
use loadpilot::error::ValidationError;

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        Some(_) | None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

/// Parses `/path`, `https://host/path` or `METHOD /path`.
pub(crate) fn parse_endpoint(s: &str) -> Result<SelectedEndpoint, ValidationError> {
    let trimmed = s.trim();
    let (method, endpoint) = match trimmed.split_once(char::is_whitespace) {
        Some((method, rest)) => (method.parse::<HttpMethod>()?, rest.trim()),
        None => (HttpMethod::Get, trimmed),
    };
    if endpoint.is_empty() || endpoint.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEndpointFormat {
            value: s.to_owned(),
        });
    }
    Ok(SelectedEndpoint {
        method,
        endpoint: endpoint.to_owned(),
        description: None,
        body: None,
    })
}
