//! Configuration for the flatbridge CLI and any other host.
//!
//! Layered TOML + environment settings, translation to
//! `flatbridge_core::BridgeConfig`, and loading of tree definition files
//! (see [`tree`]).

pub mod tree;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use flatbridge_core::{BridgeConfig, BridgeError, WritePolicy};

pub use tree::{TreeDefinition, ValueSpec, load_tree};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unsupported tree file '{}': expected a .toml or .json extension", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("invalid tree definition: {0}")]
    Tree(#[from] BridgeError),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Name reported to clients. Defaults to the root class name.
    pub service_name: Option<String>,

    /// Tree definition file to serve.
    pub tree: Option<PathBuf>,

    /// What `set_param` does with failed writes.
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Change-event buffer size.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Free-form key/value pairs returned by `info`.
    #[serde(default)]
    pub info: IndexMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: None,
            tree: None,
            write_policy: WritePolicy::default(),
            event_capacity: default_event_capacity(),
            info: IndexMap::new(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

impl Config {
    /// Validate and translate into the core runtime config.
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "event_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.service_name.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation {
                field: "service_name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(BridgeConfig {
            service_name: self.service_name.clone(),
            write_policy: self.write_policy,
            event_capacity: self.event_capacity,
            info: self.info.clone(),
        })
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "flatbridge", "flatbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("flatbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from defaults, the platform config file, an optional
/// explicit file and `FLATBRIDGE_*` environment variables, in that order.
///
/// Nested keys use a double underscore: `FLATBRIDGE_INFO__SITE=lab`.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::Validation {
                field: "config".into(),
                reason: format!("file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed("FLATBRIDGE_").split("__"))
        .extract()?;
    Ok(config)
}
