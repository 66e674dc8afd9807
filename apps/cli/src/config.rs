//! CLI configuration.
//!
//! Configuration is stored as TOML:
//! - `$XDG_CONFIG_HOME/docupload/config.toml`, or
//! - `~/.config/docupload/config.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use docupload_client::UploadConfig;
use docupload_protocol::constants::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the backend's document routes.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Upload tuning.
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_server_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            upload: UploadConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads `explicit`, or the default file if present.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Applies command-line overrides on top of file values.
    pub fn apply_overrides(
        &mut self,
        server: Option<String>,
        chunk_size: Option<u64>,
        direct_limit: Option<u64>,
    ) {
        if let Some(server) = server {
            self.server_url = server;
        }
        if let Some(size) = chunk_size {
            self.upload.chunk_size = size;
        }
        if let Some(limit) = direct_limit {
            self.upload.direct_limit = limit;
        }
    }
}

/// Default configuration file path, if a config directory can be found.
fn config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("docupload").join("config.toml"))
}
