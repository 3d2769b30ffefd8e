#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("request to document service failed")]
    Transport(#[from] reqwest::Error),
    #[error("document service responded with {status}: {message}")]
    Service { status: u16, message: String },
    #[error("malformed response from document service: {0}")]
    Decode(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
