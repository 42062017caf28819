//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::auth::{CredentialStore, TokenCodec};
use crate::cli::{info, print_user_table, success, warn};
use crate::config::{self, loader::CONFIG_FILENAME, Config};

/// Load config from an explicit path or the nearest segmentd.toml
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_config_from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => config::load_config()?,
    };
    Ok(config)
}

/// Initialize a new segmentd.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Add accounts with 'segmentd hash-password <password>' and set JWT_SECRET before 'segmentd serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Print a bcrypt hash for a password
pub async fn hash_password(password: &str, cost: u32) -> Result<()> {
    let hash = bcrypt::hash(password, cost).context("failed to hash password")?;
    println!("{}", hash);
    Ok(())
}

/// List configured accounts
pub async fn users(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = CredentialStore::from_records(config.auth.users)?;
    print_user_table(&store.records());
    Ok(())
}

/// Issue a token for a configured account
pub async fn token(config_path: Option<&Path>, username: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let store = CredentialStore::from_records(config.auth.users.clone())?;
    let record = store
        .lookup(username)
        .with_context(|| format!("user '{}' is not configured", username))?;

    let codec = TokenCodec::new(&config.auth.secret, config.auth.token_ttl())?;
    let token = codec.issue(&record.username, record.role)?;

    info(&format!(
        "Token for {} ({}) valid for {} minutes",
        record.username,
        record.role,
        codec.ttl().num_minutes()
    ));
    println!("{}", token);
    Ok(())
}
