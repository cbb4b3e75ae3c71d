use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to render engine script: {source}")]
    Render {
        #[from]
        source: std::fmt::Error,
    },
    #[error("Failed to encode {context} for engine script: {source}")]
    Encode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
