//! Stateless HTTP request builder and response parser for the flag API.
//!
//! # Design
//! `ApiClient` holds only its `Configuration` and carries no mutable state
//! between calls. Any `Operation` goes through `build` to produce an
//! `HttpRequest` and through `parse` to consume the matching `HttpResponse`.
//! The caller executes the HTTP round-trip in between, keeping the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Configuration;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::{Operation, Query};

/// Path prefix of every REST resource.
pub const API_PREFIX: [&str; 2] = ["api", "v2"];

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const API_VERSION_HEADER: &str = "ld-api-version";
pub const USER_AGENT_HEADER: &str = "user-agent";
pub const ACCEPT_HEADER: &str = "accept";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const JSON: &str = "application/json";

/// Synchronous, stateless client for the flag API.
///
/// Cheap to clone and safe to share between threads; concurrent calls are
/// independent of each other.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Configuration,
}

impl ApiClient {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Turn `op` into a complete request: URL, headers and JSON body.
    pub fn build<O: Operation>(&self, op: &O) -> Result<HttpRequest, ApiError> {
        let method = op.method();
        let url = self.url_for(&op.path(), &op.query())?;
        let body = op.body()?;

        let mut headers = Vec::with_capacity(5 + self.config.default_headers.len());
        if let Some(token) = &self.config.access_token {
            headers.push((AUTHORIZATION_HEADER.to_string(), token.clone()));
        }
        headers.push((API_VERSION_HEADER.to_string(), self.config.api_version.clone()));
        headers.push((USER_AGENT_HEADER.to_string(), self.config.user_agent.clone()));
        headers.push((ACCEPT_HEADER.to_string(), JSON.to_string()));
        if body.is_some() {
            headers.push((CONTENT_TYPE_HEADER.to_string(), JSON.to_string()));
        }
        headers.extend(self.config.default_headers.iter().cloned());

        debug!(%method, %url, has_body = body.is_some(), "built request");
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Map the response status and decode the body for `op`.
    pub fn parse<O: Operation>(&self, op: &O, response: HttpResponse) -> Result<O::Output, ApiError> {
        if !op.accepts(response.status) {
            let err = ApiError::from_response(&response);
            debug!(status = response.status, error = %err, "request rejected");
            return Err(err);
        }
        if !op.expects_body() {
            debug!(status = response.status, bytes = response.body.len(), "ignoring response body");
            return decode(response.status, "");
        }
        debug!(status = response.status, bytes = response.body.len(), "decoding response");
        decode(response.status, &response.body)
    }

    fn url_for(&self, segments: &[String], query: &Query) -> Result<String, ApiError> {
        // The URL parser drops or collapses these, addressing a different resource.
        if let Some(bad) = segments.iter().find(|s| matches!(s.as_str(), "" | "." | "..")) {
            return Err(ApiError::InvalidUrl(format!("path segment {bad:?} cannot address a resource")));
        }
        let base = self.config.base_url();
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url.into())
    }
}

/// Decode a success body. An empty body reads as JSON `null` so `()` outputs
/// accept `204 No Content`.
fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|source| ApiError::Deserialization {
        status,
        body: body.to_string(),
        source,
    })
}
