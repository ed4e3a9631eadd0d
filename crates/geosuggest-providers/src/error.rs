use thiserror::Error;
pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Service reported an error: {0}")]
    Service(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Scripted failure: {0}")]
    Scripted(String),
}
