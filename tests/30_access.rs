mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

#[tokio::test]
async fn missing_bearer_is_unauthorized() -> Result<()> {
    let server = common::TestServer::start().await?;

    for (method, path) in [
        ("POST", format!("/api/impersonate/{}", server.owner.id)),
        ("GET", "/api/impersonate/businesses".to_string()),
        ("POST", "/api/impersonate/revert".to_string()),
        ("GET", "/api/impersonate/status".to_string()),
    ] {
        let res = match method {
            "POST" => server.client.post(server.url(&path)).send().await?,
            _ => server.client.get(server.url(&path)).send().await?,
        };
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);

        let body: Value = res.json().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn business_roles_cannot_reach_elevated_routes() -> Result<()> {
    let server = common::TestServer::start().await?;
    let owner_token = server.token_for(&server.owner);

    let res = server
        .client
        .post(server.url(&format!("/api/impersonate/{}", server.cashier.id)))
        .bearer_auth(&owner_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .get(server.url("/api/impersonate/businesses"))
        .bearer_auth(&owner_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(server.audit.entries().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn platform_admins_cannot_be_impersonated() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server
        .client
        .post(server.url(&format!("/api/impersonate/{}", server.admin.id)))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn unverified_users_cannot_be_impersonated() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server
        .client
        .post(server.url(&format!("/api/impersonate/{}", server.unverified.id)))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn unknown_target_is_not_found() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server
        .client
        .post(server.url(&format!("/api/impersonate/{}", Uuid::new_v4())))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn malformed_target_id_is_bad_request() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/api/impersonate/not-a-uuid"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn stale_admin_claim_is_rechecked_against_directory() -> Result<()> {
    let server = common::TestServer::start().await?;

    // Token claims the platform tier but the id is not a platform admin
    let mut forged = server.owner.clone();
    forged.role = superuser_api::database::models::UserRole::SuperAdmin;
    let token = server.token_for(&forged);

    let res = server
        .client
        .post(server.url(&format!("/api/impersonate/{}", server.cashier.id)))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
