//! Config file parsing for `~/.config/lnt-formats/config.toml`.
//!
//! Only conversion defaults live here; everything else about a format is
//! fixed by its registration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::convert::AUTO;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Input format name, or `<auto>` to detect.
    #[serde(default = "default_input_format")]
    pub input_format: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_input_format() -> String {
    AUTO.to_string()
}
fn default_output_format() -> String {
    "json".to_string()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_format: default_input_format(),
            output_format: default_output_format(),
        }
    }
}

impl AppConfig {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parse config text. Missing sections and keys take their defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load config from the default path. A missing or unreadable file yields defaults.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return AppConfig::default(),
    };

    match parse_config(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
            AppConfig::default()
        }
    }
}

/// Return the default config file path (for init and show).
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("lnt-formats");
        p.push("config.toml");
        p
    })
}
