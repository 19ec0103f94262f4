use anyhow::{bail, Context};
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::models::user::{normalize_username, RegisterRequest};
use crate::database::models::{NewUser, Role};
use crate::database::{DatabaseManager, PgUserStore, UserStore};

pub const PASSWORD_ENV: &str = "LUI_ADMIN_PASSWORD";

pub async fn handle(
    username: String,
    name: String,
    password: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => std::env::var(PASSWORD_ENV)
            .with_context(|| format!("--password not given and {} is not set", PASSWORD_ENV))?,
    };

    let request = RegisterRequest { username, password, name };
    if let Err(errors) = request.validate() {
        bail!("{}", errors);
    }

    let pool = DatabaseManager::connect(&config::config().database)?;
    DatabaseManager::migrate(&pool).await?;

    let user = PgUserStore::new(pool)
        .insert(NewUser {
            username: normalize_username(&request.username),
            password_hash: hash_password(&request.password)?,
            name: request.name.trim().to_string(),
            role: Role::Admin,
        })
        .await?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "data": user })),
        OutputFormat::Text => println!("Created admin {} ({})", user.username, user.id),
    }
    Ok(())
}
