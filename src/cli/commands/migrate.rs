use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::manager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config::config().database;
    let pool = manager::connect(database).await?;
    manager::migrate(&pool).await?;
    pool.close().await;
    output_success(output_format, "Migrations applied", None)
}
