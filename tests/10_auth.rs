mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;

use bizops_api::auth::{encode_jwt, generate_jwt, Claims};
use common::{admin_token, error_code, token, TestApp};

#[tokio::test]
async fn public_endpoints_need_no_token() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], json!("memory"));

    let (status, body) = app.request(Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["resources"].as_array().unwrap().contains(&json!("orders")));
    Ok(())
}

#[tokio::test]
async fn api_requires_a_valid_bearer_token() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/v1/clients", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, _) = app.get("/v1/clients", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = encode_jwt(&Claims::new(1, 1, vec![], vec!["get clients".into()]), "someone-else")?;
    let (status, _) = app.get("/v1/clients", &forged).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = generate_jwt(&Claims::with_ttl(1, 1, vec![], vec!["get clients".into()], Duration::hours(-1)))?;
    let (status, body) = app.get("/v1/clients", &expired).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], json!("Token has expired"));
    Ok(())
}

#[tokio::test]
async fn whoami_echoes_the_token() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/v1/auth/whoami", &token(3, 9, &["get orders"])).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], json!(9));
    assert_eq!(body["data"]["tenant_id"], json!(3));
    assert_eq!(body["data"]["permissions"], json!(["get orders"]));
    assert_eq!(body["data"]["roles"], json!(["tester"]));
    Ok(())
}

#[tokio::test]
async fn each_route_checks_its_permission_string() -> Result<()> {
    let app = TestApp::new();
    let id = app.create("clients", &admin_token(1), json!({ "name": "Acme" })).await?;
    let reader = token(1, 2, &["get clients"]);

    let (status, _) = app.get("/v1/clients", &reader).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/v1/clients/{}", id), &reader).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/v1/clients", &reader, &json!({ "name": "Globex" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], json!("Missing permission 'create clients'"));

    let (status, _) = app.patch(&format!("/v1/clients/{}", id), &reader, &json!({ "name": "A" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/v1/clients/{}", id), &reader).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Permissions do not carry across resources
    let (status, _) = app.get("/v1/orders", &reader).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn checks_run_resource_then_permission_then_input() -> Result<()> {
    let app = TestApp::new();
    let nobody = token(1, 2, &[]);

    // Unknown resource wins over a missing permission
    let (status, body) = app.get("/v1/widgets", &nobody).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    // Missing permission wins over a malformed body or id
    let (status, _) = app.post("/v1/clients", &nobody, &json!([1, 2, 3])).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/v1/clients/abc", &nobody).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let reader = token(1, 2, &["get clients"]);
    let (status, body) = app.get("/v1/clients/abc", &reader).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
    Ok(())
}
