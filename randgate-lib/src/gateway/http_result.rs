use http::StatusCode;
use thiserror::Error;

use crate::security::RateLimitExceeded;

/// Handler result type, T is typically a hyper::Response
/// HandlerError is rendered as a synthetic error response
pub(crate) type HandlerResult<T> = std::result::Result<T, HandlerError>;

/// Everything that ends a request early with a fixed status code.
///
/// Only the delivery pipeline recovers locally (core failure triggers the
/// VRF attempt); each of these propagates straight to the boundary.
#[derive(Debug, Error, Clone)]
pub(crate) enum HandlerError {
    #[error("invalid api key")]
    Unauthorized,

    #[error("rate limit exceeded; retry in ~{retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    BadRequest(String),

    #[error("no matching route")]
    NotFound,

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl From<HandlerError> for StatusCode {
    fn from(e: HandlerError) -> StatusCode {
        match e {
            HandlerError::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound => StatusCode::NOT_FOUND,
            HandlerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RateLimitExceeded> for HandlerError {
    fn from(e: RateLimitExceeded) -> Self {
        HandlerError::RateLimited { retry_after_secs: e.retry_after_secs }
    }
}
