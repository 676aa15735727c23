mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn query_forwards_identity_and_default_priority() -> Result<()> {
    let (server, fakes) = common::spawn_with_fakes().await?;

    let res = server
        .as_user(server.post("/api/v1/ai/query"), "t1", 42)
        .json(&json!({"query": "hi"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body, json!({"response": "ok", "provider": "openai", "tokens": 7}));

    let calls = fakes.ai.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tenant_id.as_str(), "t1");
    assert_eq!(calls[0].user_id.0, 42);
    assert_eq!(calls[0].query, "hi");
    assert_eq!(calls[0].priority, "medium");
    Ok(())
}

#[tokio::test]
async fn query_without_user_is_unauthorized() -> Result<()> {
    let config = common::test_config();
    let (services, fakes) = common::with_fakes(&config);
    let server = common::spawn_with_context_tenant(config, services, "t1").await?;

    let res = server.post("/api/v1/ai/query").json(&json!({"query": "hi"})).send().await?;
    assert_eq!(common::expect_error(res, 401).await?, "unauthorized");
    assert!(fakes.ai.calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_query_is_rejected() -> Result<()> {
    let (server, fakes) = common::spawn_with_fakes().await?;

    let res = server
        .as_user(server.post("/api/v1/ai/query"), "t1", 42)
        .json(&json!({"query": "   "}))
        .send()
        .await?;
    assert_eq!(common::expect_error(res, 400).await?, "query is required");

    let res = server
        .as_user(server.post("/api/v1/ai/query"), "t1", 42)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(common::expect_error(res, 400).await?, "invalid request body");

    assert!(fakes.ai.calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn providers_are_listed() -> Result<()> {
    let (server, _fakes) = common::spawn_with_fakes().await?;

    let body: Value = server
        .as_user(server.get("/api/v1/ai/providers"), "t1", 42)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["providers"][0]["name"], "openai");
    Ok(())
}

#[tokio::test]
async fn unconfigured_backend_is_unavailable() -> Result<()> {
    let server = common::spawn_default().await?;

    let res = server
        .as_user(server.post("/api/v1/ai/query"), "t1", 42)
        .json(&json!({"query": "hi"}))
        .send()
        .await?;
    let message = common::expect_error(res, 503).await?;
    assert!(message.ends_with("service unavailable"), "{message}");
    Ok(())
}
