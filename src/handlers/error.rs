// src/handlers/error.rs
use std::fmt;
use warp::reject::Reject;

use crate::services::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApiErrorKind {
    BadRequest,
    Configuration,
    Upstream,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Internal,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::BadRequest,
            message: message.into(),
        }
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Configuration,
            message: message.into(),
        }
    }

    pub fn upstream_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Upstream,
            message: message.into(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unconfigured(_) | FetchError::InvalidSource(_) => {
                ApiError::configuration_error(err.to_string())
            }
            FetchError::Upstream(_) => ApiError::upstream_error(err.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
