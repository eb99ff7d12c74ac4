use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopeError>;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("API rate limit exceeded")]
    RateLimitExceeded,
    #[error("HTTP error: status {status}")]
    Http { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response for {repository}: {reason}")]
    MalformedResponse { repository: String, reason: String },
    #[error("Unknown owner or organization: {0}")]
    UnknownOwner(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid repository identifier: {0}")]
    InvalidRepository(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid commit type filter: {0}")]
    InvalidFilter(String),
    #[error("Run superseded by a newer run")]
    Superseded,
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ScopeError {
    pub fn malformed(repository: impl Into<String>, reason: impl Into<String>) -> Self {
        ScopeError::MalformedResponse {
            repository: repository.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the shared API budget is exhausted.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ScopeError::RateLimitExceeded)
    }
}

impl From<ureq::Error> for ScopeError {
    fn from(err: ureq::Error) -> Self {
        ScopeError::Network(err.to_string())
    }
}
