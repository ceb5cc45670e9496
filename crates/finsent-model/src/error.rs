use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway throttled the request: {0}")]
    Throttled(String),

    #[error("embed error: {0}")]
    Embed(String),

    #[error("classify error: {0}")]
    Classify(String),

    #[error("chat error: {0}")]
    Chat(String),

    #[error("local embedding fallback error: {0}")]
    Fallback(String),
}
