use anyhow::Context;
use chrono::Duration;
use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::{utils::output_success, OutputFormat};
use crate::resources::Catalog;
use crate::types::Action;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Subject user id")]
    pub user_id: i64,

    #[arg(long, help = "Tenant id")]
    pub tenant_id: i64,

    #[arg(long = "role", help = "Role name (repeatable)")]
    pub roles: Vec<String>,

    #[arg(long = "permission", help = "Permission string such as \"get orders\" (repeatable)")]
    pub permissions: Vec<String>,

    #[arg(long, help = "Grant every permission of every resource")]
    pub all: bool,

    #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
    pub ttl_hours: Option<i64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut permissions = args.permissions;
    if args.all {
        permissions.extend(all_permissions(&Catalog::standard()));
    }
    permissions.sort();
    permissions.dedup();

    let claims = match args.ttl_hours {
        Some(hours) => Claims::with_ttl(args.user_id, args.tenant_id, args.roles, permissions, Duration::hours(hours)),
        None => Claims::new(args.user_id, args.tenant_id, args.roles, permissions),
    };
    let token = generate_jwt(&claims).context("failed to sign token; is JWT_SECRET set?")?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            output_format,
            "Token generated",
            Some(json!({ "token": token, "claims": claims })),
        )?,
    }
    Ok(())
}

pub fn all_permissions(catalog: &Catalog) -> Vec<String> {
    catalog
        .iter()
        .flat_map(|resource| Action::ALL.iter().map(move |action| resource.permission(*action)))
        .collect()
}
