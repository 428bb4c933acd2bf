mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{admin_token, error_code, TestApp};

#[tokio::test]
async fn reports_every_invalid_field() -> Result<()> {
    let app = TestApp::new();
    let admin = admin_token(1);

    let (status, body) = app
        .post("/v1/clients", &admin, &json!({ "email": "not-an-email", "colour": "red", "id": 4 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let fields = &body["error"]["fields"];
    assert_eq!(fields["name"], json!("is required"));
    assert!(fields["email"].is_string());
    assert_eq!(fields["colour"], json!("is not a recognised field"));
    assert_eq!(fields["id"], json!("is managed by the server"));
    Ok(())
}

#[tokio::test]
async fn checks_types_enumerations_and_ranges() -> Result<()> {
    let app = TestApp::new();
    let admin = admin_token(1);
    let client_id = app.create("clients", &admin, json!({ "name": "Acme" })).await?;

    let (status, body) = app
        .post(
            "/v1/quotes",
            &admin,
            &json!({ "client_id": client_id, "status": "lost", "issued_on": "31/12/2024", "total": -1 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["error"]["fields"].as_object().unwrap();
    assert!(fields.contains_key("status"));
    assert!(fields.contains_key("issued_on"));
    assert!(fields.contains_key("total"));

    let (status, body) = app
        .post("/v1/quotes", &admin, &json!({ "client_id": client_id, "issued_on": "2024-12-31", "total": 99.5 }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], json!("draft"));
    assert_eq!(body["data"]["issued_on"], json!("2024-12-31"));
    Ok(())
}

#[tokio::test]
async fn references_must_exist() -> Result<()> {
    let app = TestApp::new();
    let admin = admin_token(1);

    let (status, body) = app.post("/v1/jobs", &admin, &json!({ "order_id": 12, "title": "Fit" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["fields"]["order_id"], json!("order 12 does not exist"));
    Ok(())
}

#[tokio::test]
async fn rejects_malformed_bodies() -> Result<()> {
    let app = TestApp::new();
    let admin = admin_token(1);

    let (status, body) = app.post("/v1/clients", &admin, &json!(["Acme"])).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, body) = app.request(Method::POST, "/v1/clients", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_JSON");

    let id = app.create("clients", &admin, json!({ "name": "Acme" })).await?;
    let (status, body) = app.patch(&format!("/v1/clients/{}", id), &admin, &json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], json!("Request body must contain at least one field"));

    let (status, _) = app.patch(&format!("/v1/clients/{}", id), &admin, &json!({ "name": null })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
