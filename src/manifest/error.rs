use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Read(#[source] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Manifest root is not a JSON object")]
    NotAnObject,

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write manifest: {0}")]
    Write(#[source] std::io::Error),

    #[error("No dependency field at {pointer} for {name}")]
    MissingField { pointer: String, name: String },

    #[error("Background task failed: {0}")]
    Task(String),
}
