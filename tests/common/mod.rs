#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use bizops_api::auth::{generate_jwt, Claims};
use bizops_api::cli::commands::token::all_permissions;
use bizops_api::config;
use bizops_api::database::MemoryStore;
use bizops_api::resources::Catalog;
use bizops_api::{app, AppState};

/// Router over a fresh in-memory store, driven with `oneshot`
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), Catalog::standard());
        Self {
            router: app(state, config::config()),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await.context("router failed")?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, json))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: &Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    /// Create a record and return its id, failing the test on any non-201
    pub async fn create(&self, resource: &str, token: &str, body: Value) -> Result<i64> {
        let (status, payload) = self.post(&format!("/v1/{}", resource), token, &body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed with {}: {}", resource, status, payload);
        payload["data"]["id"].as_i64().context("created record has no id")
    }
}

pub fn token(tenant_id: i64, user_id: i64, permissions: &[&str]) -> String {
    let claims = Claims::new(
        user_id,
        tenant_id,
        vec!["tester".to_string()],
        permissions.iter().map(|p| p.to_string()).collect(),
    );
    generate_jwt(&claims).expect("sign test token")
}

/// Token holding every permission of every resource
pub fn admin_token(tenant_id: i64) -> String {
    let claims = Claims::new(1, tenant_id, vec!["admin".to_string()], all_permissions(&Catalog::standard()));
    generate_jwt(&claims).expect("sign test token")
}

pub fn error_code(payload: &Value) -> &str {
    payload["error"]["code"].as_str().unwrap_or_default()
}
