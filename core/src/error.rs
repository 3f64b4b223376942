//! Error types for the flag API client.
//!
//! # Design
//! Every documented error status gets a dedicated variant so callers can match
//! on the kind without inspecting numbers. Each carries a `StatusError` holding
//! the original status, the raw body, the decoded `ErrorRep` when the body had
//! that shape, and any rate-limit headers. Statuses outside the documented set
//! land in `UnexpectedStatus` with the same payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpResponse;
use crate::ratelimit::RateLimit;

/// Fixed-shape error body returned by the service for every 4xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A non-success response, surfaced verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusError {
    pub status: u16,
    pub body: String,
    /// `None` when the body was empty or not an `ErrorRep`.
    pub rep: Option<ErrorRep>,
    pub rate_limit: RateLimit,
}

impl StatusError {
    pub fn from_response(response: &HttpResponse) -> Self {
        let rep = decode_rep(&response.body);
        if rep.is_none() && !response.body.trim().is_empty() {
            tracing::warn!(status = response.status, "error body is not an error representation");
        }
        Self {
            status: response.status,
            body: response.body.clone(),
            rep,
            rate_limit: RateLimit::from_response(response),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.rep.as_ref()?.code.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.rep.as_ref()?.message.as_deref()
    }
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code(), self.message()) {
            (Some(code), Some(message)) => write!(f, "HTTP {} {code}: {message}", self.status),
            (None, Some(message)) => write!(f, "HTTP {}: {message}", self.status),
            (Some(code), None) => write!(f, "HTTP {} {code}", self.status),
            (None, None) if self.body.is_empty() => write!(f, "HTTP {}", self.status),
            (None, None) => write!(f, "HTTP {}: {}", self.status, self.body),
        }
    }
}

fn decode_rep(body: &str) -> Option<ErrorRep> {
    let rep: ErrorRep = serde_json::from_str(body).ok()?;
    if rep.code.is_none() && rep.message.is_none() {
        return None;
    }
    Some(rep)
}

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: the request was malformed or failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(StatusError),

    /// 401: missing or unknown access token.
    #[error("unauthorized: {0}")]
    Unauthorized(StatusError),

    /// 403: the token lacks permission for this operation.
    #[error("forbidden: {0}")]
    Forbidden(StatusError),

    /// 404: the resource does not exist.
    #[error("not found: {0}")]
    NotFound(StatusError),

    /// 405: the path exists but not for this verb.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(StatusError),

    /// 409: the resource already exists or was modified concurrently.
    #[error("conflict: {0}")]
    Conflict(StatusError),

    /// 429: rate limited. See `StatusError::rate_limit`.
    #[error("rate limited: {0}")]
    RateLimited(StatusError),

    /// Any other status the operation does not accept.
    #[error("unexpected status: {0}")]
    UnexpectedStatus(StatusError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A success response body could not be decoded into the expected type.
    #[error("deserialization of HTTP {status} body failed: {source}")]
    Deserialization {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot host the request path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The round-trip did not complete within the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// Network-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Map a non-accepted response onto the status taxonomy.
    pub fn from_response(response: &HttpResponse) -> Self {
        let err = StatusError::from_response(response);
        match response.status {
            400 => ApiError::InvalidRequest(err),
            401 => ApiError::Unauthorized(err),
            403 => ApiError::Forbidden(err),
            404 => ApiError::NotFound(err),
            405 => ApiError::MethodNotAllowed(err),
            409 => ApiError::Conflict(err),
            429 => ApiError::RateLimited(err),
            _ => ApiError::UnexpectedStatus(err),
        }
    }

    pub fn status_error(&self) -> Option<&StatusError> {
        match self {
            ApiError::InvalidRequest(err)
            | ApiError::Unauthorized(err)
            | ApiError::Forbidden(err)
            | ApiError::NotFound(err)
            | ApiError::MethodNotAllowed(err)
            | ApiError::Conflict(err)
            | ApiError::RateLimited(err)
            | ApiError::UnexpectedStatus(err) => Some(err),
            _ => None,
        }
    }

    /// The HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Deserialization { status, .. } => Some(*status),
            _ => self.status_error().map(|err| err.status),
        }
    }

    /// The raw response body, if the error came from a response.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Deserialization { body, .. } => Some(body),
            _ => self.status_error().map(|err| err.body.as_str()),
        }
    }

    pub fn rep(&self) -> Option<&ErrorRep> {
        self.status_error()?.rep.as_ref()
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.status_error().map(|err| &err.rate_limit)
    }

    /// Whether waiting and resending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimited(_) | ApiError::Timeout)
    }
}
