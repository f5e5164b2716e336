mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use member_api::types::Role;

#[tokio::test]
async fn first_read_creates_record_without_password() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/users/me"))
        .header("authorization", server.bearer("1100"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["identity_id"], "1100");
    assert_eq!(body["bio"], "");
    assert_eq!(body["website"], "");
    assert_eq!(body["roles"], json!(["user"]));
    assert!(body.get("password").is_none(), "credential leaked: {}", body);
    assert!(body.get("id").and_then(Value::as_str).is_some());

    assert_eq!(server.directory.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_reads_share_one_record() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();
    let bearer = server.bearer("1100");

    let (a, b) = tokio::join!(
        client.get(server.url("/users/me")).header("authorization", &bearer).send(),
        client.get(server.url("/users/me")).header("authorization", &bearer).send(),
    );
    let a = a?.json::<Value>().await?;
    let b = b?.json::<Value>().await?;

    assert_eq!(a["id"], b["id"]);
    assert_eq!(server.directory.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn profile_update_ignores_roles() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();
    let user = server.seed("1100", &[Role::User]).await?;

    let res = client
        .put(server.url("/users/me"))
        .header("authorization", server.bearer("1100"))
        .json(&json!({"bio": "x", "twitter": "@ada", "roles": ["founder"], "password": "p"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"message": "Profile updated successfully"}));

    let stored = server.stored("1100").await?;
    assert_eq!(stored.bio, "x");
    assert_eq!(stored.twitter, "@ada");
    assert_eq!(stored.roles, vec![Role::User]);
    assert!(stored.password.is_none());
    assert_eq!(stored.id, user.id);
    Ok(())
}

#[tokio::test]
async fn unreadable_profile_body_is_500_and_writes_nothing() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    for body in ["bio=x", r#"{"bio":5}"#, "[1]"] {
        let res = client
            .put(server.url("/users/me"))
            .header("authorization", server.bearer("1100"))
            .body(body)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "body {}", body);
        assert_eq!(
            res.json::<Value>().await?,
            json!({"error": "Failed to update profile", "code": "INTERNAL_SERVER_ERROR"})
        );
    }
    assert_eq!(server.directory.writes(), 0);
    Ok(())
}

#[tokio::test]
async fn anonymous_profile_requests_are_401() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let get = client.get(server.url("/users/me")).send().await?;
    assert_eq!(get.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get.json::<Value>().await?["error"], "Unauthorized");

    let put = client
        .put(server.url("/users/me"))
        .header("authorization", "Bearer garbage")
        .json(&json!({"bio": "x"}))
        .send()
        .await?;
    assert_eq!(put.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(server.directory.reads(), 0);
    assert_eq!(server.directory.writes(), 0);
    Ok(())
}
