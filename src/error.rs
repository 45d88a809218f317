use thiserror::Error;

/// A request that never produced an HTTP response (timeout, refused connection, broken body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-200 answer. Never retried.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: TransportError,
    },
}

/// No usable cookie set could be obtained. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session unavailable: {0}")]
pub struct SessionUnavailable(pub String);
