use anyhow::{bail, Context};
use serde_json::Value;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;

pub async fn handle(url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = url.unwrap_or_else(|| {
        let server = &config::config().server;
        format!("http://{}:{}", server.host, server.port)
    });
    let health_url = format!("{}/health", base.trim_end_matches('/'));

    let response = reqwest::get(&health_url)
        .await
        .with_context(|| format!("could not reach {}", health_url))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        bail!("{} answered {}: {}", health_url, status, body);
    }
    output_success(
        output_format,
        &format!("{} is healthy", base),
        Some(serde_json::json!({ "health": body })),
    )
}
