use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No endpoints selected. Select at least one endpoint to load test.")]
    EmptyEndpoints,
    #[error("Target URL is required.")]
    MissingTargetUrl,
    #[error("Invalid target URL '{value}': {source}")]
    InvalidTargetUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported target URL scheme '{scheme}'. Use http or https.")]
    UnsupportedTargetScheme { scheme: String },
    #[error("Endpoint #{index} has an empty path.")]
    EmptyEndpoint { index: usize },
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Test duration must be greater than zero.")]
    ZeroDuration,
    #[error("Invalid endpoint '{value}'. Expected '/path' or 'METHOD /path'.")]
    InvalidEndpointFormat { value: String },
    #[error("Unknown HTTP method '{value}'.")]
    UnknownHttpMethod { value: String },
    #[error("Unknown load profile '{value}'. Use constant, ramp-up, spike, stress or soak.")]
    UnknownLoadProfile { value: String },
}
