//! Station list configuration.
//!
//! Stations are read from a YAML file in one of two shapes. A plain list of
//! ids:
//!
//! ```yaml
//! - 46042
//! - 46026
//! ```
//!
//! or a mapping of id to optional details:
//!
//! ```yaml
//! 46042:
//!   name: Monterey
//! 46026: San Francisco
//! 51208:
//!   spec_file: gfswave.51208.spec
//! ```
//!
//! Unquoted numeric ids are taken as written. Ids with leading zeros must be
//! quoted, or YAML reads them as numbers.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use forecast_cache::CleanPolicy;

use crate::error::{ForecastError, Result};

/// One configured station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    pub id: String,
    /// Display name recorded in the forecast index
    pub name: Option<String>,
    /// Spectrum file name, overriding the default template
    pub spec_file: Option<String>,
}

impl StationConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            spec_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StationDetails {
    name: Option<String>,
    spec_file: Option<String>,
}

/// The stations to forecast, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationsConfig {
    stations: Vec<StationConfig>,
}

impl StationsConfig {
    /// Load a stations file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ForecastError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&contents)?;
        info!(path = %path.display(), stations = config.len(), "Loaded stations config");
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(contents)?;
        Self::from_value(value)
    }

    /// A config holding just the given station ids.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        for id in ids {
            config.push(StationConfig::new(id));
        }
        config
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut config = Self::default();
        match value {
            Value::Null => {}
            Value::Sequence(items) => {
                for item in &items {
                    let id = scalar_id(item).ok_or_else(|| {
                        ForecastError::InvalidConfig(format!("station id must be a scalar: {item:?}"))
                    })?;
                    config.push(StationConfig::new(id));
                }
            }
            Value::Mapping(map) => {
                for (key, details) in map {
                    let id = scalar_id(&key).ok_or_else(|| {
                        ForecastError::InvalidConfig(format!("station id must be a scalar: {key:?}"))
                    })?;
                    let details = match details {
                        Value::Null => StationDetails::default(),
                        Value::String(name) => StationDetails {
                            name: Some(name),
                            spec_file: None,
                        },
                        other => serde_yaml::from_value(other)?,
                    };
                    config.push(StationConfig {
                        id,
                        name: details.name,
                        spec_file: details.spec_file,
                    });
                }
            }
            other => {
                return Err(ForecastError::InvalidConfig(format!(
                    "stations must be a list or a mapping, got {other:?}"
                )))
            }
        }
        Ok(config)
    }

    fn push(&mut self, station: StationConfig) {
        if self.get(&station.id).is_some() {
            warn!(station = %station.id, "Duplicate station in config, ignoring");
            return;
        }
        self.stations.push(station);
    }

    pub fn stations(&self) -> &[StationConfig] {
        &self.stations
    }

    pub fn get(&self, id: &str) -> Option<&StationConfig> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Retention policy that keeps exactly the configured stations.
    pub fn keep_policy(&self) -> CleanPolicy {
        let ids: BTreeSet<String> = self.stations.iter().map(|s| s.id.clone()).collect();
        CleanPolicy::KeepStations(ids)
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}
