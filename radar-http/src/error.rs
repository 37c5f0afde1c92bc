use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("subprocess failed: {0}")]
    Process(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FetchError>;
