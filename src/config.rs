//! Run configuration for the binary: file locations and per-pipeline settings.
//!
//! Everything is passed in explicitly; nothing here reads the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::calendar::AggregationConfig;

/// Where inputs come from and where the output goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoConfig {
    /// Samples (ergot) or dated observations (calendar), CSV.
    pub input: Option<PathBuf>,
    /// District boundaries, GeoJSON.
    pub districts: Option<PathBuf>,
    /// Precomputed `district,neighbor` adjacency list, CSV.
    pub neighbors: Option<PathBuf>,
    pub output: PathBuf,
    /// Feature property holding the integer district id.
    #[serde(default = "default_id_property")]
    pub id_property: String,
}

fn default_id_property() -> String { "district".to_string() }

impl IoConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self { output: output.into(), id_property: default_id_property(), ..Self::default() }
    }

    pub fn input(&self) -> Result<&Path> {
        self.input.as_deref().context("[config] no input file configured")
    }
}

/// Calendar pipeline settings.
///
/// `years` and `districts` fix the output grid; when absent they are taken
/// from the observations themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    #[serde(flatten)]
    pub aggregation: AggregationConfig,
    pub years: Option<Vec<i64>>,
    pub districts: Option<Vec<i64>>,
}

/// Load any serde config struct from a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("[config] Invalid config in {:?}", path))
}
