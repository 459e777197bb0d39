// File: rusty-forms-live/src/config.rs
// Purpose: Validator configuration parsed from forms.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Validator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub forms: FormDefaults,

    #[serde(default)]
    pub messages: MessageConfig,
}

/// Defaults for server-side checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// HTTP method used when a rule does not pick one (default: POST)
    #[serde(default = "default_method")]
    pub method: String,

    /// Quiet period before a check is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Per-request timeout for the HTTP transport
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Message used when a check cannot be completed
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

/// Marker names handed to the display sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_valid_marker")]
    pub valid_marker: String,

    #[serde(default = "default_invalid_marker")]
    pub invalid_marker: String,
}

/// Policy applied by `FormPolicy::from_defaults`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefaults {
    #[serde(default = "default_true")]
    pub validate_on_change: bool,

    #[serde(default = "default_true")]
    pub show_errors_on_submit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageConfig {
    /// Shown when a declared constraint cannot be interpreted
    #[serde(default = "default_malformed_rule")]
    pub malformed_rule: String,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_fallback_message() -> String {
    "validation unavailable".to_string()
}

fn default_valid_marker() -> String {
    "user-valid".to_string()
}

fn default_invalid_marker() -> String {
    "user-invalid".to_string()
}

fn default_malformed_rule() -> String {
    "Invalid validation rule".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            debounce_ms: default_debounce_ms(),
            timeout_ms: default_timeout_ms(),
            fallback_message: default_fallback_message(),
        }
    }
}

impl RemoteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            valid_marker: default_valid_marker(),
            invalid_marker: default_invalid_marker(),
        }
    }
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            show_errors_on_submit: true,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            malformed_rule: default_malformed_rule(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ValidatorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.remote_method().with_context(|| {
            format!("Invalid [remote] method in config file: {:?}", path)
        })?;

        Ok(config)
    }

    /// Load configuration from default path (./forms.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("forms.toml")
    }

    /// Default remote method as an HTTP method
    pub fn remote_method(&self) -> Result<reqwest::Method> {
        reqwest::Method::from_bytes(self.remote.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("Unknown HTTP method: {}", self.remote.method))
    }
}
