//! Front-end configuration.
//!
//! Loads the core [`Config`] from YAML, then applies environment overrides.
//! Command-line overrides are applied by `main` on top of both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderctl_core::Config;
use serde::Deserialize;

/// Configuration file contents: the core record plus front-end settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cache file location.
    /// Override: `RENDERCTL_CACHE_FILE`
    pub cache_file: Option<PathBuf>,

    #[serde(flatten)]
    pub core: Config,
}

/// `RENDERCTL_*` variables and the core field each one sets.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("RENDERCTL_MODE", "mode"),
    ("RENDERCTL_TARGET_IP", "target_ip"),
    ("RENDERCTL_TARGET_PORT", "target_port"),
    ("RENDERCTL_TARGET_PATH", "target_path"),
    ("RENDERCTL_VENDOR", "vendor"),
    ("RENDERCTL_LOCAL_IP", "local_ip"),
    ("RENDERCTL_SERVE_PORT", "serve_port"),
    ("RENDERCTL_SSDP_TIMEOUT", "ssdp_timeout_secs"),
    ("RENDERCTL_DEEP_SEARCH", "deep_search"),
    ("RENDERCTL_USE_CACHE", "use_cache"),
];

impl AppConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides; invalid values are logged and skipped.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, field) in ENV_OVERRIDES {
            if let Some(value) = lookup(var) {
                if let Err(e) = self.core.set_field(field, &value) {
                    log::warn!("Ignoring {}={}: {}", var, value, e);
                }
            }
        }

        if let Some(path) = lookup("RENDERCTL_CACHE_FILE").filter(|p| !p.is_empty()) {
            self.cache_file = Some(PathBuf::from(path));
        }
    }

    /// Applies `key=value` overrides through the core field table.
    pub fn apply_sets(&mut self, sets: &[String]) -> Result<()> {
        for set in sets {
            let (key, value) = set
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{}'", set))?;
            self.core
                .set_field(key.trim(), value)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid --set {}", set))?;
        }
        Ok(())
    }
}
