use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::models::{Collection, Environment, Flag, Project, Segment};
use mock_server::{app, app_with, MockConfig, DEFAULT_ACCESS_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, DEFAULT_ACCESS_TOKEN)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, DEFAULT_ACCESS_TOKEN)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn assert_error(response: axum::response::Response, status: StatusCode, code: &str) -> String {
    assert_eq!(response.status(), status);
    let body: Value = body_json(response).await;
    assert_eq!(body["code"], code);
    body["message"].as_str().unwrap().to_string()
}

/// An app with project `demo` (production + test environments).
async fn seeded() -> Router {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/api/v2/projects", r#"{"name":"Demo","key":"demo"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    app
}

async fn create_flag(app: &Router, key: &str) -> Flag {
    let body = format!(r#"{{"name":"Flag {key}","key":"{key}","tags":["web"]}}"#);
    let resp = send(app, json_request("POST", "/api/v2/flags/demo", &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v2/projects").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_error(resp, StatusCode::UNAUTHORIZED, "unauthorized").await;
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v2/projects")
                .header(http::header::AUTHORIZATION, "api-not-a-token")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_error(resp, StatusCode::UNAUTHORIZED, "unauthorized").await;
}

#[tokio::test]
async fn read_only_token_can_read_but_not_write() {
    let app = app_with(MockConfig {
        read_only_token: Some("api-reader".into()),
        ..MockConfig::default()
    });
    let read = Request::builder()
        .uri("/api/v2/projects")
        .header(http::header::AUTHORIZATION, "api-reader")
        .body(String::new())
        .unwrap();
    assert_eq!(send(&app, read).await.status(), StatusCode::OK);

    let write = Request::builder()
        .method("POST")
        .uri("/api/v2/projects")
        .header(http::header::AUTHORIZATION, "api-reader")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(r#"{"name":"Demo","key":"demo"}"#.to_string())
        .unwrap();
    assert_error(send(&app, write).await, StatusCode::FORBIDDEN, "forbidden").await;
}

// --- rate limiting ---

#[tokio::test]
async fn exhausted_budget_returns_429_with_headers() {
    let app = app_with(MockConfig {
        request_budget: Some(2),
        ..MockConfig::default()
    });
    let first = send(&app, request("GET", "/api/v2/projects")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-route-remaining"], "1");
    let second = send(&app, request("GET", "/api/v2/projects")).await;
    assert_eq!(second.headers()["x-ratelimit-route-remaining"], "0");

    let third = send(&app, request("GET", "/api/v2/projects")).await;
    assert_eq!(third.headers()["retry-after"], "60");
    assert_eq!(third.headers()["x-ratelimit-global-remaining"], "0");
    let reset: i64 = third.headers()["x-ratelimit-reset"].to_str().unwrap().parse().unwrap();
    assert!(reset > 0);
    assert_error(third, StatusCode::TOO_MANY_REQUESTS, "rate_limited").await;
}

// --- routing ---

#[tokio::test]
async fn unknown_route_is_404_json() {
    let resp = send(&app(), request("GET", "/api/v2/nope")).await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
}

#[tokio::test]
async fn wrong_method_is_405_json() {
    let resp = send(&app(), request("PUT", "/api/v2/projects")).await;
    assert_error(resp, StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed").await;
}

// --- projects ---

#[tokio::test]
async fn project_creation_seeds_environments() {
    let app = seeded().await;
    let resp = send(&app, request("GET", "/api/v2/projects/demo")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let project: Project = body_json(resp).await;
    let keys: Vec<String> = project.environments.unwrap().into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec!["production", "test"]);
    assert_eq!(project.links["self"].href, "/api/v2/projects/demo");
}

#[tokio::test]
async fn duplicate_project_conflicts() {
    let app = seeded().await;
    let resp = send(
        &app,
        json_request("POST", "/api/v2/projects", r#"{"name":"Again","key":"demo"}"#),
    )
    .await;
    assert_error(resp, StatusCode::CONFLICT, "conflict").await;
}

#[tokio::test]
async fn malformed_and_incomplete_bodies_are_rejected() {
    let app = app();
    let resp = send(&app, json_request("POST", "/api/v2/projects", "{not json")).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;

    let resp = send(&app, json_request("POST", "/api/v2/projects", r#"{"name":"No key"}"#)).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;

    let resp = send(
        &app,
        json_request("POST", "/api/v2/projects", r#"{"name":"Bad","key":"has space"}"#),
    )
    .await;
    let message = assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;
    assert!(message.contains("key"));
}

#[tokio::test]
async fn list_projects_pages_and_filters() {
    let app = app();
    for key in ["alpha", "beta", "gamma"] {
        let body = format!(r#"{{"name":"{key}","key":"{key}"}}"#);
        send(&app, json_request("POST", "/api/v2/projects", &body)).await;
    }
    let resp = send(&app, request("GET", "/api/v2/projects?limit=1&offset=1")).await;
    let page: Collection<Project> = body_json(resp).await;
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].key, "beta");
    assert_eq!(page.links["self"].href, "/api/v2/projects?limit=1&offset=1");

    let resp = send(&app, request("GET", "/api/v2/projects?filter=query%3Agam")).await;
    let filtered: Collection<Project> = body_json(resp).await;
    assert_eq!(filtered.total_count, 1);

    let resp = send(&app, request("GET", "/api/v2/projects?limit=abc")).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;
}

#[tokio::test]
async fn delete_project_then_404() {
    let app = seeded().await;
    let resp = send(&app, request("DELETE", "/api/v2/projects/demo")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, request("GET", "/api/v2/projects/demo")).await;
    let message = assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
    assert_eq!(message, "Unknown project: demo");
}

// --- environments ---

#[tokio::test]
async fn environment_lifecycle() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/v2/projects/demo/environments",
            r#"{"name":"Staging","key":"staging","color":"00ff00"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let env: Environment = body_json(resp).await;
    assert!(env.api_key.starts_with("sdk-"));

    // existing flags gain a config for the new environment
    let flag: Flag = body_json(send(&app, request("GET", "/api/v2/flags/demo/dark-mode")).await).await;
    assert!(flag.environments.contains_key("staging"));

    let resp = send(&app, request("DELETE", "/api/v2/projects/demo/environments/staging")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, request("GET", "/api/v2/projects/demo/environments/staging")).await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
}

// --- flags ---

#[tokio::test]
async fn create_flag_defaults_to_boolean() {
    let app = seeded().await;
    let flag = create_flag(&app, "dark-mode").await;
    assert_eq!(flag.kind, "boolean");
    assert_eq!(flag.version, 1);
    assert_eq!(flag.variations.len(), 2);
    assert_eq!(flag.environments.len(), 2);
    assert!(!flag.environments["production"].on);
    assert_eq!(flag.environments["production"].site.href, "/demo/production/features/dark-mode");
}

#[tokio::test]
async fn create_flag_in_unknown_project_is_404() {
    let resp = send(
        &app(),
        json_request("POST", "/api/v2/flags/missing", r#"{"name":"A","key":"a"}"#),
    )
    .await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
}

#[tokio::test]
async fn duplicate_flag_conflicts() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;
    let resp = send(
        &app,
        json_request("POST", "/api/v2/flags/demo", r#"{"name":"Again","key":"dark-mode"}"#),
    )
    .await;
    assert_error(resp, StatusCode::CONFLICT, "conflict").await;
}

#[tokio::test]
async fn clone_copies_environment_settings() {
    let app = seeded().await;
    create_flag(&app, "source").await;
    let patch = r#"{"patch":[{"op":"replace","path":"/environments/production/on","value":true}]}"#;
    let resp = send(&app, json_request("PATCH", "/api/v2/flags/demo/source", patch)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        json_request("POST", "/api/v2/flags/demo?clone=source", r#"{"name":"Copy","key":"copy"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let copy: Flag = body_json(resp).await;
    assert!(copy.environments["production"].on);
    assert_eq!(copy.environments["production"].version, 1);
}

#[tokio::test]
async fn list_flags_filters_by_env_and_tag() {
    let app = seeded().await;
    create_flag(&app, "a-flag").await;
    create_flag(&app, "b-flag").await;

    let resp = send(&app, request("GET", "/api/v2/flags/demo?env=production&tag=web&limit=1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Collection<Flag> = body_json(resp).await;
    assert_eq!(page.total_count, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].key, "a-flag");
    let envs: Vec<&String> = page.items[0].environments.keys().collect();
    assert_eq!(envs, vec!["production"]);

    let resp = send(&app, request("GET", "/api/v2/flags/demo?tag=mobile")).await;
    let none: Collection<Flag> = body_json(resp).await;
    assert_eq!(none.total_count, 0);

    let resp = send(&app, request("GET", "/api/v2/flags/demo?sort=-key")).await;
    let sorted: Collection<Flag> = body_json(resp).await;
    assert_eq!(sorted.items[0].key, "b-flag");

    let resp = send(&app, request("GET", "/api/v2/flags/demo?env=nowhere")).await;
    assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;
}

#[tokio::test]
async fn get_flag_restricted_to_env() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;
    let resp = send(&app, request("GET", "/api/v2/flags/demo/dark-mode?env=test")).await;
    let flag: Flag = body_json(resp).await;
    assert_eq!(flag.environments.len(), 1);
    assert!(flag.environments.contains_key("test"));
}

#[tokio::test]
async fn patch_flag_bumps_versions() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;
    let patch = r#"{
        "comment": "ship it",
        "patch": [
            {"op": "replace", "path": "/name", "value": "Dark mode"},
            {"op": "replace", "path": "/environments/production/on", "value": true}
        ]
    }"#;
    let resp = send(&app, json_request("PATCH", "/api/v2/flags/demo/dark-mode", patch)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let flag: Flag = body_json(resp).await;
    assert_eq!(flag.name, "Dark mode");
    assert_eq!(flag.version, 2);
    assert_eq!(flag.environments["production"].version, 2);
    assert_eq!(flag.environments["test"].version, 1);
}

#[tokio::test]
async fn invalid_patches_are_rejected() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;
    let cases = [
        r#"{"patch":[{"op":"replace","path":"/missing","value":1}]}"#,
        r#"{"patch":[{"op":"replace","path":"/key","value":"other"}]}"#,
        r#"{"patch":[{"op":"test","path":"/_version","value":7}]}"#,
        r#"{"patch":"nope"}"#,
    ];
    for body in cases {
        let resp = send(&app, json_request("PATCH", "/api/v2/flags/demo/dark-mode", body)).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "invalid_request").await;
    }
    let flag: Flag = body_json(send(&app, request("GET", "/api/v2/flags/demo/dark-mode")).await).await;
    assert_eq!(flag.version, 1);
}

#[tokio::test]
async fn delete_flag_then_404() {
    let app = seeded().await;
    create_flag(&app, "dark-mode").await;
    let resp = send(&app, request("DELETE", "/api/v2/flags/demo/dark-mode")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, request("DELETE", "/api/v2/flags/demo/dark-mode")).await;
    let message = assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
    assert_eq!(message, "Unknown flag: dark-mode");
}

// --- segments ---

#[tokio::test]
async fn segment_lifecycle() {
    let app = seeded().await;
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/v2/segments/demo/production",
            r#"{"name":"Beta users","key":"beta-users"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let segment: Segment = body_json(resp).await;
    assert_eq!(segment.version, 1);

    let patch = r#"{"patch":[{"op":"add","path":"/included/-","value":"user-1"}]}"#;
    let resp = send(
        &app,
        json_request("PATCH", "/api/v2/segments/demo/production/beta-users", patch),
    )
    .await;
    let patched: Segment = body_json(resp).await;
    assert_eq!(patched.included, vec!["user-1"]);
    assert_eq!(patched.version, 2);

    let resp = send(&app, request("GET", "/api/v2/segments/demo/production")).await;
    let list: Collection<Segment> = body_json(resp).await;
    assert_eq!(list.total_count, 1);

    // segments are per environment
    let resp = send(&app, request("GET", "/api/v2/segments/demo/test/beta-users")).await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;

    let resp = send(&app, request("DELETE", "/api/v2/segments/demo/production/beta-users")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, request("GET", "/api/v2/segments/demo/production/beta-users")).await;
    assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
}

#[tokio::test]
async fn segments_in_unknown_environment_are_404() {
    let app = seeded().await;
    let resp = send(&app, request("GET", "/api/v2/segments/demo/staging")).await;
    let message = assert_error(resp, StatusCode::NOT_FOUND, "not_found").await;
    assert_eq!(message, "Unknown environment: staging");
}
