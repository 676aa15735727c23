mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_default().await?;

    let res = server.get("/health").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn index_lists_endpoints() -> Result<()> {
    let server = common::spawn_default().await?;

    let body: Value = server.get("/").send().await?.json().await?;
    assert_eq!(body["name"], "VyomTech API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["endpoints"]["ai"].is_string());
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_and_propagated() -> Result<()> {
    let server = common::spawn_default().await?;

    let res = server.get("/health").send().await?;
    let generated = res.headers().get("x-request-id").expect("request id header");
    assert!(!generated.is_empty());

    let res = server.get("/health").header("x-request-id", "abc-123").send().await?;
    assert_eq!(res.headers().get("x-request-id").unwrap(), "abc-123");
    Ok(())
}

#[tokio::test]
async fn malformed_bearer_token_is_rejected_before_routing() -> Result<()> {
    let server = common::spawn_default().await?;

    let res = server.get("/api/v1/calls/ping").bearer_auth("not-a-jwt").send().await?;
    assert_eq!(common::expect_error(res, 401).await?, "unauthorized");
    Ok(())
}
