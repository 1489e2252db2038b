//! GitHub client against a local stand-in for the REST API

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ratemynext_core::{EntryKind, ErrorKind, GitHubConfig, RateConfig, RateError, SourceHost};
use ratemynext_repo::{ApiClientConfig, GitHubApiClient};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

const TOKEN: &str = "secret";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("token {}", TOKEN))
        .unwrap_or(false)
}

async fn repo_info(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "full_name": "acme/site", "default_branch": "trunk" })).into_response()
}

async fn tree(Path(git_ref): Path<String>) -> Response {
    if git_ref != "trunk" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "sha": "abc123",
        "truncated": false,
        "tree": [
            { "path": "next.config.js", "type": "blob" },
            { "path": "app", "type": "tree" },
            { "path": "app/page.tsx", "type": "blob" },
            { "type": "blob" }
        ]
    }))
    .into_response()
}

async fn contents(
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.get("ref").map(String::as_str) != Some("trunk") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match path.as_str() {
        // wrapped the way the API wraps long base64 payloads
        "package.json" | "apps web/package.json" => Json(json!({
            "encoding": "base64",
            "content": "eyJkZXBlbmRlbmNpZXMiOnsi\ndGFpbHdpbmRjc3MiOiI0In19\n"
        }))
        .into_response(),
        "weird.txt" => Json(json!({ "encoding": "none", "content": "" })).into_response(),
        "limited.json" => (
            StatusCode::FORBIDDEN,
            [("x-ratelimit-remaining", "0")],
            "{}",
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response(),
    }
}

async fn limited() -> Response {
    (
        StatusCode::FORBIDDEN,
        [("x-ratelimit-remaining", "0"), ("retry-after", "30")],
        Json(json!({ "message": "Forbidden" })),
    )
        .into_response()
}

async fn throttled() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": "API rate limit exceeded for 127.0.0.1." })),
    )
        .into_response()
}

async fn private() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": "Resource not accessible" })),
    )
        .into_response()
}

async fn broken_tree() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response()
}

/// Start the stand-in API and return a client pointed at it
async fn spawn_api(token: Option<&str>) -> GitHubApiClient {
    let app = Router::new()
        .route("/repos/acme/site", get(repo_info))
        .route("/repos/acme/site/git/trees/{git_ref}", get(tree))
        .route("/repos/acme/site/contents/{*path}", get(contents))
        .route("/repos/acme/limited", get(limited))
        .route("/repos/acme/throttled", get(throttled))
        .route("/repos/acme/private", get(private))
        .route("/repos/acme/broken/git/trees/{git_ref}", get(broken_tree));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let settings = GitHubConfig {
        base_url: format!("http://{}", addr),
        timeout_seconds: 5,
        ..RateConfig::default().github
    };
    let config = ApiClientConfig::from_config(&settings, token.map(str::to_string));
    GitHubApiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_default_branch_sends_token() {
    let client = spawn_api(Some(TOKEN)).await;
    let branch = client.get_default_branch("acme", "site").await.unwrap();
    assert_eq!(branch, "trunk");
}

#[tokio::test]
async fn test_bad_token_is_invalid_token() {
    let client = spawn_api(Some("wrong")).await;
    let err = client.get_default_branch("acme", "site").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_unknown_repository_is_not_found() {
    let client = spawn_api(Some(TOKEN)).await;
    let err = client.get_default_branch("acme", "gone").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RepoNotFound);
}

#[tokio::test]
async fn test_tree_listing_keeps_entry_kinds() {
    let client = spawn_api(None).await;
    let listing = client.get_tree("acme", "site", "trunk").await.unwrap();

    assert!(!listing.truncated);
    let paths: Vec<(&str, EntryKind)> = listing
        .entries
        .iter()
        .map(|e| (e.path.as_str(), e.kind))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("next.config.js", EntryKind::Blob),
            ("app", EntryKind::Tree),
            ("app/page.tsx", EntryKind::Blob),
        ]
    );
}

#[tokio::test]
async fn test_failed_tree_is_fetch_failed() {
    let client = spawn_api(None).await;
    let err = client.get_tree("acme", "broken", "trunk").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchFailed);
}

#[tokio::test]
async fn test_file_content_is_decoded() {
    let client = spawn_api(None).await;
    let content = client
        .get_file_content("acme", "site", "package.json", "trunk")
        .await
        .unwrap();
    assert_eq!(
        content.as_deref(),
        Some(r#"{"dependencies":{"tailwindcss":"4"}}"#)
    );
}

#[tokio::test]
async fn test_file_path_segments_are_encoded() {
    let client = spawn_api(None).await;
    let content = client
        .get_file_content("acme", "site", "apps web/package.json", "trunk")
        .await
        .unwrap();
    assert!(content.unwrap().contains("tailwindcss"));
}

#[tokio::test]
async fn test_missing_file_is_none() {
    let client = spawn_api(None).await;
    let content = client
        .get_file_content("acme", "site", "next.config.mjs", "trunk")
        .await
        .unwrap();
    assert_eq!(content, None);
}

#[tokio::test]
async fn test_unexpected_encoding_is_rejected() {
    let client = spawn_api(None).await;
    let err = client
        .get_file_content("acme", "site", "weird.txt", "trunk")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnexpected);
}

#[tokio::test]
async fn test_exhausted_rate_limit_header() {
    let client = spawn_api(None).await;

    let err = client.get_default_branch("acme", "limited").await.unwrap_err();
    match err {
        RateError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, Some(30)),
        other => panic!("Expected RateLimited, got {:?}", other),
    }

    let err = client
        .get_file_content("acme", "site", "limited.json", "trunk")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[tokio::test]
async fn test_rate_limit_message_in_body() {
    let client = spawn_api(None).await;
    let err = client
        .get_default_branch("acme", "throttled")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[tokio::test]
async fn test_plain_forbidden_requires_auth() {
    let client = spawn_api(None).await;
    let err = client.get_default_branch("acme", "private").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthRequired);
}
