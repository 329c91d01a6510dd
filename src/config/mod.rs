//! Configuration management for `issue_tracker`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ISSUE_TRACKER_*`, plus `PORT`)
//! 3. Config file (`--config <path>` or `./issue-tracker.yaml`)
//! 4. Defaults

use crate::error::{IssueTrackerError, Result};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "issue-tracker.yaml";
/// Default database filename.
const DEFAULT_DB_FILENAME: &str = "issues.db";
/// Database path that selects an in-memory store.
pub const MEMORY_DB: &str = ":memory:";
/// Prefix for environment overrides.
const ENV_PREFIX: &str = "ISSUE_TRACKER_";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// A flat configuration layer of normalized `kebab-case` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from an explicit set of environment variables.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        let mut prefixed = Vec::new();

        for (key, value) in vars {
            if key == "PORT" {
                insert_key_value(&mut layer, "port", value);
            } else if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                prefixed.push((stripped.to_string(), value));
            }
        }

        // Prefixed variables beat the bare `PORT`.
        for (key, value) in prefixed {
            insert_key_value(&mut layer, &key, value);
        }

        layer
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(&normalize_key(key))
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub lock_timeout: Option<u64>,
    pub log_json: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            insert_key_value(&mut layer, "db", path.to_string_lossy().to_string());
        }
        if let Some(host) = &self.host {
            insert_key_value(&mut layer, "host", host.clone());
        }
        if let Some(port) = self.port {
            insert_key_value(&mut layer, "port", port.to_string());
        }
        if let Some(timeout) = self.lock_timeout {
            insert_key_value(&mut layer, "lock-timeout", timeout.to_string());
        }
        if let Some(json) = self.log_json {
            insert_key_value(&mut layer, "log-json", json.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    insert_key_value(&mut layer, "db", DEFAULT_DB_FILENAME.to_string());
    insert_key_value(&mut layer, "host", DEFAULT_HOST.to_string());
    insert_key_value(&mut layer, "port", DEFAULT_PORT.to_string());
    insert_key_value(
        &mut layer,
        "lock-timeout",
        DEFAULT_LOCK_TIMEOUT_MS.to_string(),
    );
    insert_key_value(&mut layer, "log-json", "false".to_string());
    layer
}

/// Load configuration with the documented precedence order.
///
/// `config_path` names an explicit config file, which must exist. Without
/// one, `issue-tracker.yaml` in the working directory is used when present.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let file_layer = match config_path {
        Some(path) => {
            if !path.is_file() {
                return Err(IssueTrackerError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            ConfigLayer::from_yaml(path)?
        }
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILENAME))?,
    };

    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        file_layer,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    #[must_use]
    pub fn from_config_value(value: &str) -> Self {
        if value.trim() == MEMORY_DB {
            Self::Memory
        } else {
            Self::File(PathBuf::from(value.trim()))
        }
    }
}

/// Fully resolved, typed server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database: DatabaseLocation,
    pub host: String,
    pub port: u16,
    pub lock_timeout_ms: u64,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::File(PathBuf::from(DEFAULT_DB_FILENAME)),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Resolve typed settings from a merged layer. Missing keys fall back to
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `IssueTrackerError::Config` when a value cannot be parsed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();

        let database = layer
            .get("db")
            .filter(|value| !value.trim().is_empty())
            .map_or(defaults.database, |value| {
                DatabaseLocation::from_config_value(value)
            });

        let host = layer
            .get("host")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.host);

        let port = match layer.get("port") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| IssueTrackerError::Config(format!("invalid port: {value}")))?,
            None => defaults.port,
        };

        let lock_timeout_ms = match layer.get("lock-timeout") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                IssueTrackerError::Config(format!("invalid lock-timeout: {value}"))
            })?,
            None => defaults.lock_timeout_ms,
        };

        let log_json = match layer.get("log-json") {
            Some(value) => parse_bool(value).ok_or_else(|| {
                IssueTrackerError::Config(format!("invalid log-json: {value}"))
            })?,
            None => defaults.log_json,
        };

        Ok(Self {
            database,
            host,
            port,
            lock_timeout_ms,
            log_json,
        })
    }
}

fn insert_key_value(layer: &mut ConfigLayer, key: &str, value: String) {
    layer.values.insert(normalize_key(key), value);
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        insert_key_value(&mut layer, &key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
