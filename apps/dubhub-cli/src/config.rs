//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/dubhub/cli.toml`
//! - Windows: `%APPDATA%/dubhub/cli.toml`
//!
//! `DUBHUB_BACKEND_URL` and `DUBHUB_TOKEN` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dubhub_protocol::OperationType;
use dubhub_protocol::constants::{CHUNK_SEND_DELAY, DEFAULT_BACKEND_URL, STATUS_POLL_INTERVAL};
use dubhub_upload::{ChunkFraming, SessionConfig};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Backend API base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Session token from the last login.
    #[serde(default)]
    pub token: String,

    /// Operation used when `--operation` is not given.
    #[serde(default = "default_operation")]
    pub default_operation: OperationType,

    /// Prefix every chunk with a JSON header instead of sending bare bytes.
    #[serde(default)]
    pub tagged_chunks: bool,

    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}

fn default_operation() -> OperationType {
    OperationType::PersianDubbing
}

fn default_chunk_delay_ms() -> u64 {
    CHUNK_SEND_DELAY.as_millis() as u64
}

fn default_poll_interval_secs() -> u64 {
    STATUS_POLL_INTERVAL.as_secs()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            token: String::new(),
            default_operation: default_operation(),
            tagged_chunks: false,
            chunk_delay_ms: default_chunk_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `path`, or returns defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (holds the session token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies `DUBHUB_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("DUBHUB_BACKEND_URL").ok(),
            std::env::var("DUBHUB_TOKEN").ok(),
        );
    }

    fn apply_overrides(&mut self, backend_url: Option<String>, token: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.backend_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = token;
        }
    }

    /// Stored token, if any.
    pub fn token(&self) -> Option<&str> {
        let token = self.token.trim();
        (!token.is_empty()).then_some(token)
    }

    /// Upload session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            framing: if self.tagged_chunks {
                ChunkFraming::Tagged
            } else {
                ChunkFraming::Raw
            },
            ..SessionConfig::default()
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("dubhub").join("cli.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("dubhub")
            .join("cli.toml")
    }
}
