//! The `courier.config.ron` file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use courier_dispatch::{DispatchConfig, SmtpConfig, TemplateConfig};
use courier_state::StateConfig;
use serde::Deserialize;

use crate::source::RecipientSourceConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "COURIER_CONFIG";

/// Everything a campaign run needs, as read from the configuration file.
#[derive(Debug, Deserialize)]
pub struct Courier {
    /// Caps, pacing, retries and the logins to rotate through
    #[serde(alias = "dispatch")]
    pub campaign: DispatchConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Where the record of contacted identifiers lives
    #[serde(default)]
    pub state: StateConfig,

    pub template: TemplateConfig,

    pub recipients: RecipientSourceConfig,

    /// JSON object mapping each login to its secret
    pub credentials: PathBuf,

    /// JSON object mapping email addresses to `true` (deliverable) or `false`
    #[serde(default)]
    pub validity: Option<PathBuf>,

    /// Also append log output to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Courier {
    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    /// If the file cannot be read or is not valid configuration.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Parse configuration text.
    ///
    /// # Errors
    /// If `content` is not valid RON for this configuration.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }
}

/// Find the configuration file using the following precedence:
/// 1. An explicitly given path (`--config`)
/// 2. `COURIER_CONFIG` environment variable
/// 3. ./courier.config.ron (current working directory)
/// 4. /etc/courier/courier.config.ron (system-wide config)
///
/// # Errors
/// If an explicit or environment path does not exist, or none of the default
/// locations hold a file.
pub fn find_config_file(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        anyhow::ensure!(
            path.exists(),
            "Config file does not exist: {}",
            path.display()
        );
        return Ok(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "{CONFIG_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        PathBuf::from("./courier.config.ron"),
        PathBuf::from("/etc/courier/courier.config.ron"),
    ];

    if let Some(path) = default_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}
