//! Job configuration: an ordered string-keyed map of tunables.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

/// Ordered map of job settings. All values are kept as strings so unknown
/// keys pass through import, stamping and export untouched; typed reads
/// parse on access.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    entries: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw string value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// Sets a value, stringifying it.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    /// Removes a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Parses the value for a key. Absent keys yield `Ok(None)`, present but
    /// unparsable values an [InvalidValue](TunerError::InvalidValue) error.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|_| TunerError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
            }),
        }
    }

    /// Parses the value for a key, falling back to `default` when absent.
    pub fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a configuration from a YAML mapping. Scalar values of any YAML
    /// type are accepted and stored as strings.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self> {
        let text = std::fs::read_to_string(&file).map_err(|e| TunerError::document(&file, e))?;
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&text).map_err(|e| TunerError::document(&file, e))?;
        let mut config = Configuration::new();
        for (key, value) in raw {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    return Err(TunerError::document(
                        &file,
                        format!("value for {} is not a scalar: {:?}", key, other),
                    ))
                }
            };
            config.set(key, value);
        }
        Ok(config)
    }

    /// Writes the configuration as a YAML mapping.
    pub fn save_yaml<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let text = self.to_yaml();
        std::fs::write(&file, text).map_err(|e| TunerError::document(&file, e))
    }

    /// Renders the configuration as a YAML mapping.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.entries).expect("string map always serializes")
    }
}
