//! TOML configuration file support.
//!
//! Loads from (in order):
//! 1. An explicit `--config` path
//! 2. `cclicense.toml` next to the executable
//! 3. `%LOCALAPPDATA%\CipherCore\cclicense.toml` (Windows) or
//!    `~/.config/cclicense/config.toml`
//! 4. Environment variable overrides (e.g. `CCLICENSE_PUBLIC_KEY`)
//!
//! CLI arguments always take precedence over config file values. Nothing in
//! the library reads this; the CLI passes values explicitly.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ResultExt as _};

// ---------------------------------------------------------------------------
// Config structs (map 1-to-1 with the TOML sections)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LicenseToolConfig {
    pub keys: KeysConfig,
    pub issue: IssueConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// Edition written into issued tokens and expected by `validate`.
    pub version: String,
    pub validity_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Path to a JSON-lines structured log file. Empty string means no file
    /// logging.
    pub json_log_file: String,
    /// Whether to also output JSON to stdout (for container pipelines).
    pub json_stdout: bool,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            private_key: PathBuf::from("private_key.pem"),
            public_key: PathBuf::from("public_key.pem"),
        }
    }
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            version: "Pro".to_string(),
            validity_days: 365,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_log_file: String::new(),
            json_stdout: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl LicenseToolConfig {
    /// Try to load from a specific path. Returns `Ok(default)` if the file
    /// does not exist; returns `Err` if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .ctx_config(&format!("read config file {}", path.display()))?;
        let cfg: LicenseToolConfig = toml::from_str(&text).ctx_config("parse config TOML")?;
        Ok(cfg)
    }

    /// Load config using the standard search order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }

        if let Ok(exe) = std::env::current_exe() {
            let candidate = exe.with_file_name("cclicense.toml");
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        #[cfg(windows)]
        {
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                let candidate = PathBuf::from(local).join("CipherCore").join("cclicense.toml");
                if candidate.exists() {
                    return Self::load_from(&candidate);
                }
            }
        }

        #[cfg(not(windows))]
        {
            if let Some(home) = std::env::var_os("HOME") {
                let candidate = PathBuf::from(home)
                    .join(".config")
                    .join("cclicense")
                    .join("config.toml");
                if candidate.exists() {
                    return Self::load_from(&candidate);
                }
            }
        }

        Ok(Self::default())
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(p) = std::env::var("CCLICENSE_PRIVATE_KEY") {
            self.keys.private_key = PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CCLICENSE_PUBLIC_KEY") {
            self.keys.public_key = PathBuf::from(p);
        }
        if let Ok(level) = std::env::var("CCLICENSE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
