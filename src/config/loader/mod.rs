use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `~/.chatrelay`, or `./.chatrelay` when there is no home directory.
pub fn get_chatrelay_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".chatrelay"), |home| home.join(".chatrelay"))
}

pub fn get_config_path() -> PathBuf {
    get_chatrelay_home().join("config.json")
}

/// Load config from `config_path` (or the default path) and apply env
/// overrides. A missing file yields defaults. Validation is left to the
/// caller so `check` can report problems instead of failing to load.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = get_config_path();
    let path = config_path.unwrap_or(default_path.as_path());

    let mut config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        check_file_permissions(path);
        parse_config(&content)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?
    } else {
        debug!("no config at {}, using defaults", path.display());
        Config::default()
    };

    crate::config::credentials::apply_env_overrides(&mut config);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    serde_json::from_str(content).context("Failed to deserialize config")
}

/// Warn if the config file is readable by group or others.
#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                "config file {} has permissions {:o}; recommend 0600",
                path.display(),
                mode & 0o777
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {}

#[cfg(test)]
mod tests;
