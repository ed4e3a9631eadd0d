use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Provider error: {0}")]
    Provider(#[from] geosuggest_providers::ProviderError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SuggestError>;
