use crate::config::Config;
use crate::config::env::{ENV_VARS, apply_env_overrides_from};
use crate::utils::get_chatrelay_home;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_chatrelay_home()?.join("config.json"))
}

/// Load the process configuration: JSON file (if present), then environment
/// overrides, then validation. Any failure here is fatal at startup.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    load_config_with(config_path, |name| std::env::var(name).ok())
}

/// [`load_config`] with an injected environment lookup.
#[doc(hidden)]
pub fn load_config_with<F>(config_path: Option<&Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    let mut config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
        check_file_permissions(path);
        debug!("loaded config file {}", path.display());
        config
    } else {
        if config_path.is_some() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        debug!(
            "no config file at {}, using defaults and environment",
            path.display()
        );
        Config::default()
    };

    let overridden: Vec<&str> = ENV_VARS
        .iter()
        .copied()
        .filter(|name| lookup(*name).is_some_and(|v| !v.trim().is_empty()))
        .collect();
    if !overridden.is_empty() {
        debug!("environment overrides: {}", overridden.join(", "));
    }

    apply_env_overrides_from(&mut config, lookup)
        .with_context(|| "Invalid environment override")?;

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    Ok(config)
}

/// Warn if the config file is readable by group or others; it holds secrets.
#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                "config file {} has permissions {:o}, recommend 0600",
                path.display(),
                mode & 0o777
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {}
