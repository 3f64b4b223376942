//! In-memory stand-in for the feature-flag management REST API.
//!
//! Serves projects, environments, flags and segments under `/api/v2` with the
//! service's error contract: `{code, message}` bodies for 400, 401, 403, 404,
//! 405, 409 and 429. Used by the client's integration tests and runnable as a
//! binary for manual testing.

pub mod error;
pub mod models;
mod patch;
pub mod store;

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, warn};

use error::ApiFailure;
use models::{
    Collection, Environment, EnvironmentInput, Flag, FlagInput, Link, PatchInput, Project, ProjectInput, Segment,
    SegmentInput,
};
use store::{now_millis, FlagListParams, ListParams, Store};

pub const DEFAULT_ACCESS_TOKEN: &str = "api-mock-token";
pub const RETRY_AFTER_SECS: u64 = 60;

/// Credentials and limits of a mock instance.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Token with full access.
    pub access_token: String,
    /// Token allowed to issue `GET` only; writes get 403.
    pub read_only_token: Option<String>,
    /// Authenticated requests served before every further one gets 429.
    pub request_budget: Option<u32>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            access_token: DEFAULT_ACCESS_TOKEN.to_string(),
            read_only_token: None,
            request_budget: None,
        }
    }
}

impl MockConfig {
    /// Reads `MOCK_ACCESS_TOKEN`, `MOCK_READ_ONLY_TOKEN` and
    /// `MOCK_REQUEST_BUDGET`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token: std::env::var("MOCK_ACCESS_TOKEN").unwrap_or(defaults.access_token),
            read_only_token: std::env::var("MOCK_READ_ONLY_TOKEN").ok(),
            request_budget: std::env::var("MOCK_REQUEST_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    config: Arc<MockConfig>,
    requests: Arc<AtomicU32>,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::default())),
        config: Arc::new(config),
        requests: Arc::new(AtomicU32::new(0)),
    };
    Router::new()
        .route("/api/v2/projects", get(list_projects).post(create_project))
        .route("/api/v2/projects/{project}", get(get_project).delete(delete_project))
        .route(
            "/api/v2/projects/{project}/environments",
            axum::routing::post(create_environment),
        )
        .route(
            "/api/v2/projects/{project}/environments/{env}",
            get(get_environment).delete(delete_environment),
        )
        .route("/api/v2/flags/{project}", get(list_flags).post(create_flag))
        .route(
            "/api/v2/flags/{project}/{flag}",
            get(get_flag).patch(patch_flag).delete(delete_flag),
        )
        .route("/api/v2/segments/{project}/{env}", get(list_segments).post(create_segment))
        .route(
            "/api/v2/segments/{project}/{env}/{segment}",
            get(get_segment).patch(patch_segment).delete(delete_segment),
        )
        .method_not_allowed_fallback(error::method_not_allowed)
        .fallback(error::unknown_route)
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

/// Authentication, authorization and request budget, in that order.
async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let read_only = match token {
        Some(t) if t == state.config.access_token => false,
        Some(t) if state.config.read_only_token.as_deref() == Some(t) => true,
        _ => {
            warn!(method = %request.method(), path = %request.uri().path(), "rejected request without a valid token");
            return ApiFailure::unauthorized().into_response();
        }
    };
    if read_only && request.method() != Method::GET {
        warn!(method = %request.method(), path = %request.uri().path(), "read-only token attempted a write");
        return ApiFailure::forbidden().into_response();
    }

    let Some(budget) = state.config.request_budget else {
        return next.run(request).await;
    };
    let used = state.requests.fetch_add(1, Ordering::SeqCst).saturating_add(1);
    if used > budget {
        warn!(budget, used, "request budget exhausted");
        let reset = now_millis() + (RETRY_AFTER_SECS as i64) * 1000;
        return ApiFailure::rate_limited()
            .with_header("retry-after", RETRY_AFTER_SECS)
            .with_header("x-ratelimit-global-remaining", 0)
            .with_header("x-ratelimit-route-remaining", 0)
            .with_header("x-ratelimit-reset", reset)
            .into_response();
    }
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert("x-ratelimit-route-remaining", HeaderValue::from(budget - used));
    response
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiFailure> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiFailure::invalid_request(rejection.body_text()))
}

fn parse_number(name: &str, value: &str) -> Result<usize, ApiFailure> {
    value
        .parse()
        .map_err(|_| ApiFailure::invalid_request(format!("{name} must be a non-negative integer")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ApiFailure> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiFailure::invalid_request(format!("{name} must be a boolean"))),
    }
}

fn list_params(pairs: &[(String, String)]) -> Result<ListParams, ApiFailure> {
    let mut params = ListParams::default();
    for (name, value) in pairs {
        match name.as_str() {
            "limit" => params.limit = Some(parse_number(name, value)?),
            "offset" => params.offset = parse_number(name, value)?,
            "filter" => {
                let query = value
                    .strip_prefix("query:")
                    .ok_or_else(|| ApiFailure::invalid_request(format!("unsupported filter {value:?}")))?;
                params.query = Some(query.to_string());
            }
            _ => {}
        }
    }
    Ok(params)
}

fn collection<T>(uri: &Uri, items: Vec<T>, total_count: usize) -> Json<Collection<T>> {
    let links = [("self".to_string(), Link::json(uri.to_string()))].into_iter().collect();
    Json(Collection {
        items,
        total_count,
        links,
    })
}

// --- projects ---

async fn list_projects(
    State(state): State<AppState>,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Collection<Project>>, ApiFailure> {
    let params = list_params(&pairs)?;
    let (items, total) = state.store.read().await.list_projects(&params);
    Ok(collection(&uri, items, total))
}

async fn get_project(State(state): State<AppState>, Path(project): Path<String>) -> Result<Json<Project>, ApiFailure> {
    state.store.read().await.get_project(&project).map(Json)
}

async fn create_project(
    State(state): State<AppState>,
    body: Result<Json<ProjectInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ApiFailure> {
    let input = payload(body)?;
    let project = state.store.write().await.create_project(input)?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn delete_project(State(state): State<AppState>, Path(project): Path<String>) -> Result<StatusCode, ApiFailure> {
    state.store.write().await.delete_project(&project)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- environments ---

async fn get_environment(
    State(state): State<AppState>,
    Path((project, env)): Path<(String, String)>,
) -> Result<Json<Environment>, ApiFailure> {
    state.store.read().await.get_environment(&project, &env).map(Json)
}

async fn create_environment(
    State(state): State<AppState>,
    Path(project): Path<String>,
    body: Result<Json<EnvironmentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Environment>), ApiFailure> {
    let input = payload(body)?;
    let env = state.store.write().await.create_environment(&project, input)?;
    Ok((StatusCode::CREATED, Json(env)))
}

async fn delete_environment(
    State(state): State<AppState>,
    Path((project, env)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    state.store.write().await.delete_environment(&project, &env)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- flags ---

async fn list_flags(
    State(state): State<AppState>,
    Path(project): Path<String>,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Collection<Flag>>, ApiFailure> {
    let mut params = FlagListParams {
        list: list_params(&pairs)?,
        ..FlagListParams::default()
    };
    for (name, value) in &pairs {
        match name.as_str() {
            "env" => params.envs.push(value.clone()),
            "tag" => params.tag = Some(value.clone()),
            "archived" => params.archived = Some(parse_bool(name, value)?),
            "summary" => params.summary = parse_bool(name, value)?,
            "sort" => params.sort = Some(value.clone()),
            _ => {}
        }
    }
    let (items, total) = state.store.read().await.list_flags(&project, &params)?;
    Ok(collection(&uri, items, total))
}

async fn get_flag(
    State(state): State<AppState>,
    Path((project, flag)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Flag>, ApiFailure> {
    let env = pairs.iter().find(|(name, _)| name == "env").map(|(_, v)| v.as_str());
    state.store.read().await.get_flag(&project, &flag, env).map(Json)
}

async fn create_flag(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Result<Json<FlagInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Flag>), ApiFailure> {
    let input = payload(body)?;
    let clone = pairs.iter().find(|(name, _)| name == "clone").map(|(_, v)| v.as_str());
    let flag = state.store.write().await.create_flag(&project, input, clone)?;
    Ok((StatusCode::CREATED, Json(flag)))
}

async fn patch_flag(
    State(state): State<AppState>,
    Path((project, flag)): Path<(String, String)>,
    body: Result<Json<PatchInput>, JsonRejection>,
) -> Result<Json<Flag>, ApiFailure> {
    let input = payload(body)?;
    debug!(%project, %flag, comment = ?input.comment, ops = input.patch.len(), "patching flag");
    state
        .store
        .write()
        .await
        .patch_flag(&project, &flag, &input.patch)
        .map(Json)
}

async fn delete_flag(
    State(state): State<AppState>,
    Path((project, flag)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    state.store.write().await.delete_flag(&project, &flag)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- segments ---

async fn list_segments(
    State(state): State<AppState>,
    Path((project, env)): Path<(String, String)>,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Collection<Segment>>, ApiFailure> {
    let params = list_params(&pairs)?;
    let (items, total) = state.store.read().await.list_segments(&project, &env, &params)?;
    Ok(collection(&uri, items, total))
}

async fn get_segment(
    State(state): State<AppState>,
    Path((project, env, segment)): Path<(String, String, String)>,
) -> Result<Json<Segment>, ApiFailure> {
    state.store.read().await.get_segment(&project, &env, &segment).map(Json)
}

async fn create_segment(
    State(state): State<AppState>,
    Path((project, env)): Path<(String, String)>,
    body: Result<Json<SegmentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Segment>), ApiFailure> {
    let input = payload(body)?;
    let segment = state.store.write().await.create_segment(&project, &env, input)?;
    Ok((StatusCode::CREATED, Json(segment)))
}

async fn patch_segment(
    State(state): State<AppState>,
    Path((project, env, segment)): Path<(String, String, String)>,
    body: Result<Json<PatchInput>, JsonRejection>,
) -> Result<Json<Segment>, ApiFailure> {
    let input = payload(body)?;
    debug!(%project, %env, %segment, comment = ?input.comment, ops = input.patch.len(), "patching segment");
    state
        .store
        .write()
        .await
        .patch_segment(&project, &env, &segment, &input.patch)
        .map(Json)
}

async fn delete_segment(
    State(state): State<AppState>,
    Path((project, env, segment)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiFailure> {
    state.store.write().await.delete_segment(&project, &env, &segment)?;
    Ok(StatusCode::NO_CONTENT)
}
