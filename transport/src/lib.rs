//! Blocking HTTP execution for the flag API core.
//!
//! `flagapi-core` only describes requests and interprets responses. This
//! crate closes the loop: a `Transport` performs the round-trip and
//! `FlagClient` chains build, execute and parse into a single `send`.

use std::fmt;

use flagapi_core::{ApiClient, ApiError, Configuration, HttpMethod, HttpRequest, HttpResponse, Operation};
use tracing::{instrument, Span};

/// Executes one request and returns the response as data.
///
/// Non-2xx statuses are responses, not errors; only failures to obtain a
/// response at all surface as `Err`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Largest response body `UreqTransport` reads by default. Unsummarized flag
/// lists carry every environment's targeting and outgrow ureq's 10 MB default.
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// `Transport` backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(config: &Configuration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap on response body bytes; larger bodies fail with `ApiError::Transport`.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    #[instrument(name = "flag_api", skip_all, fields(method = %request.method, url = %request.url, status))]
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let body = request.body.as_deref();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), request).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), request).call(),
            HttpMethod::Post => send_body(with_headers(self.agent.post(url), request), body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(url), request), body),
            HttpMethod::Patch => send_body(with_headers(self.agent.patch(url), request), body),
        };
        let mut response = result.map_err(|err| match err {
            ureq::Error::Timeout(_) => ApiError::Timeout,
            other => ApiError::Transport(other.to_string()),
        })?;

        let status = response.status().as_u16();
        Span::current().record("status", status);
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()
            .map_err(|err| ApiError::Transport(format!("reading response body: {err}")))?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

/// The core client paired with a transport.
///
/// ```no_run
/// use flagapi_core::{ops::GetFeatureFlag, Configuration};
/// use flagapi_http::FlagClient;
///
/// let client = FlagClient::new(Configuration::from_env()?);
/// let flag = client.send(&GetFeatureFlag::new("default", "dark-mode"))?;
/// println!("{} is at version {:?}", flag.key, flag.version);
/// # Ok::<(), flagapi_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FlagClient<T = UreqTransport> {
    api: ApiClient,
    transport: T,
}

impl FlagClient<UreqTransport> {
    pub fn new(config: Configuration) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> FlagClient<T> {
    pub fn with_transport(config: Configuration, transport: T) -> Self {
        Self {
            api: ApiClient::new(config),
            transport,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build, execute and parse `op`.
    pub fn send<O: Operation>(&self, op: &O) -> Result<O::Output, ApiError> {
        let request = self.api.build(op)?;
        let response = self.transport.execute(&request)?;
        self.api.parse(op, response)
    }
}
