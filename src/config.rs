//! Configuration records and station settings
//!
//! A `ConfigRecord` is the flat mapping of primary-parameter names to values
//! that seeds a parameter set: the last-used values of one transmitter, or a
//! hand-written preset. Files may be TOML or JSON; saved records are pretty
//! JSON.
//!
//! `StationSettings` holds the values shared by all transmitters at one
//! station: the media directory and the list of USRP addresses.

use crate::error::{GraphError, GraphResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Address used when no station settings list any USRP
pub const DEFAULT_USRP_ADDRESS: &str = "192.168.10.2";

/// A single configuration entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Number(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Number(v as f64)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

impl From<&ConfigValue> for Value {
    fn from(v: &ConfigValue) -> Self {
        match v {
            ConfigValue::Bool(b) => Value::Integer(i64::from(*b)),
            ConfigValue::Number(n) => Value::Real(*n),
            ConfigValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl TryFrom<&Value> for ConfigValue {
    type Error = String;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Real(n) => Ok(ConfigValue::Number(*n)),
            Value::Integer(n) => Ok(ConfigValue::Number(*n as f64)),
            Value::Text(s) => Ok(ConfigValue::Text(s.clone())),
            other => Err(format!("{} values cannot be stored in a configuration", other.type_name())),
        }
    }
}

/// Flat mapping of primary-parameter names to values
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRecord {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<ConfigValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ConfigValue>) {
        self.entries.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ConfigValue> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from a TOML or JSON file
    pub fn load(path: &Path) -> GraphResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse from string content
    pub fn parse(content: &str) -> GraphResult<Self> {
        // Try TOML format first
        if let Ok(record) = toml::from_str(content) {
            return Ok(record);
        }

        serde_json::from_str(content).map_err(|e| GraphError::Serde(e.to_string()))
    }

    /// Save as pretty JSON
    pub fn save(&self, path: &Path) -> GraphResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Serde(e.to_string()))
    }
}

/// Settings shared by every transmitter at a station
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSettings {
    /// Directory holding audio, video and transport-stream files
    #[serde(default)]
    pub media_directory: String,
    /// USRP addresses; USRP number `n` is entry `n - 1`
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

impl StationSettings {
    /// `<config dir>/txchain/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("txchain").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> GraphResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| GraphError::Serde(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> GraphResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data =
            serde_json::to_string_pretty(self).map_err(|e| GraphError::Serde(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Address of USRP number `usrp` (1-based)
    ///
    /// With no configured addresses only USRP 1 exists, at the default address.
    pub fn usrp_address(&self, usrp: usize) -> GraphResult<String> {
        if self.ip_addresses.is_empty() && usrp == 1 {
            return Ok(DEFAULT_USRP_ADDRESS.to_string());
        }
        usrp.checked_sub(1)
            .and_then(|i| self.ip_addresses.get(i))
            .cloned()
            .ok_or_else(|| GraphError::Configuration {
                parameter: "usrpNum".to_string(),
                reason: format!(
                    "USRP {} not configured ({} addresses known)",
                    usrp,
                    self.ip_addresses.len().max(1)
                ),
            })
    }

    /// Full path of a media file
    pub fn media_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.media_directory).join(file_name)
    }
}
