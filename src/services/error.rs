// src/services/error.rs
use std::fmt;

/// Failure taxonomy for the fetch layer.
///
/// All three kinds are fatal for the call that raised them and are never
/// retried here; retry policy belongs to the caller. Row-level problems
/// inside an otherwise valid response (a bad value, a bad date) are not
/// errors at all: the offending record is dropped instead.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// A required credential is missing. Raised before any network call.
    Unconfigured(String),
    /// The source descriptor is malformed or ambiguous. Raised before any
    /// network call.
    InvalidSource(String),
    /// Network failure, non-success HTTP status, or an unparseable or
    /// incomplete response body.
    Upstream(String),
}

impl FetchError {
    pub fn unconfigured(message: impl Into<String>) -> Self {
        FetchError::Unconfigured(message.into())
    }

    pub fn invalid_source(message: impl Into<String>) -> Self {
        FetchError::InvalidSource(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        FetchError::Upstream(message.into())
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Unconfigured(message) => write!(f, "not configured: {}", message),
            FetchError::InvalidSource(message) => write!(f, "invalid source: {}", message),
            FetchError::Upstream(message) => write!(f, "upstream failure: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Upstream(err.to_string())
    }
}

impl From<csv::Error> for FetchError {
    fn from(err: csv::Error) -> Self {
        FetchError::Upstream(err.to_string())
    }
}
