mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds_without_database() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "disabled");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body: Value = server.client.get(server.url("/")).send().await?.json().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["impersonate"].is_string());
    Ok(())
}
