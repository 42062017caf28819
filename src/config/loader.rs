//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "segmentd.toml";

/// Load configuration from segmentd.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // This regex is a compile-time constant, panicking is acceptable here
    // as it indicates a programming error in the codebase, not a runtime issue
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# segmentd configuration

[server]
host = "0.0.0.0"
port = 8000
# upload_dir = "/var/tmp/segmentd-uploads"
max_upload_bytes = 536870912

[auth]
# Signing secret for bearer tokens. Keep it out of version control.
secret = "${JWT_SECRET}"
token_ttl_minutes = 30

# Accounts. Generate hashes with 'segmentd hash-password <password>'.
# Roles are "user" (prediction) or "admin" (evaluation and drift reports).
# [[auth.users]]
# username = "admin"
# password_hash = "$2b$12$..."
# role = "admin"

[model]
# Invoked as: <command> <args..> predict|segmented|case|evaluate ...
command = "python"
args = ["-m", "app.model_cli"]
timeout_secs = 300

[dataset]
path = "./data/brain_data"

[monitoring]
report_path = "./data/brain_data/drift_seg_report.html"
# Invoked as: <command> <args..> --output <path>
command = "python"
args = ["-m", "app.elt_report"]
"#
}
