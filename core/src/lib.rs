//! Synchronous API client core for a feature-flag management service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, keeping the core deterministic and testable.
//!
//! # Design
//! - `ApiClient` is stateless; it holds only its `Configuration`.
//! - Every REST call is an `Operation`: a plain struct with path, query and
//!   body parameters. `ApiClient::build` and `ApiClient::parse` are the only
//!   two steps, shared by all operations.
//! - Non-success statuses map onto `ApiError` by status code and keep the raw
//!   body, the decoded `ErrorRep` and the rate-limit headers.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod operation;
pub mod ops;
pub mod ratelimit;

pub use client::ApiClient;
pub use config::Configuration;
pub use error::{ApiError, ErrorRep, StatusError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{Operation, Query};
pub use ratelimit::RateLimit;
