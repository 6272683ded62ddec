use thiserror::Error;

/// Failure to retrieve one page from a source.
///
/// Never fatal: the coordinator logs it, skips the page and moves
/// on. The page is retried at the next scheduled run, not sooner.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

/// Persistence failure other than a dedup-key collision.
///
/// Collisions are not errors; stores report them as
/// `InsertOutcome::Duplicate`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend: {0}")]
    Backend(String),
}
