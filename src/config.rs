//! Index configuration.
//!
//! `GeoConfig` is an immutable value handed to the index at construction.
//! It is serializable so it can be loaded from JSON or, with the `toml`
//! feature, from TOML files.
//!
//! ```rust
//! use geodex::GeoConfig;
//!
//! let json = r#"{
//!     "table_name": "restaurants",
//!     "partition_key_length": 5,
//!     "worker_threads": 4
//! }"#;
//! let config = GeoConfig::from_json_str(json).unwrap();
//! assert_eq!(config.partition_key_length, 5);
//! assert_eq!(config.index_attribute, "geohash");
//! ```
use crate::error::{GeoError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Parameters handed to the S2 region coverer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoveringConfig {
    #[serde(default = "CoveringConfig::default_min_level")]
    pub min_level: u8,

    #[serde(default = "CoveringConfig::default_max_level")]
    pub max_level: u8,

    #[serde(default = "CoveringConfig::default_level_mod")]
    pub level_mod: u8,

    /// Soft cap on the number of cells in a covering
    #[serde(default = "CoveringConfig::default_max_cells")]
    pub max_cells: usize,
}

impl CoveringConfig {
    const fn default_min_level() -> u8 {
        0
    }

    const fn default_max_level() -> u8 {
        30
    }

    const fn default_level_mod() -> u8 {
        1
    }

    const fn default_max_cells() -> usize {
        8
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_level > 30 {
            return Err(GeoError::InvalidConfig(format!(
                "covering max_level must be <= 30, got {}",
                self.max_level
            )));
        }
        if self.min_level > self.max_level {
            return Err(GeoError::InvalidConfig(format!(
                "covering min_level ({}) must be <= max_level ({})",
                self.min_level, self.max_level
            )));
        }
        if !(1..=3).contains(&self.level_mod) {
            return Err(GeoError::InvalidConfig(format!(
                "covering level_mod must be between 1 and 3, got {}",
                self.level_mod
            )));
        }
        if self.max_cells == 0 {
            return Err(GeoError::InvalidConfig(
                "covering max_cells must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CoveringConfig {
    fn default() -> Self {
        Self {
            min_level: Self::default_min_level(),
            max_level: Self::default_max_level(),
            level_mod: Self::default_level_mod(),
            max_cells: Self::default_max_cells(),
        }
    }
}

/// Geo index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    #[serde(default = "GeoConfig::default_table_name")]
    pub table_name: String,

    #[serde(default = "GeoConfig::default_partition_key_attribute")]
    pub partition_key_attribute: String,

    #[serde(default = "GeoConfig::default_range_key_attribute")]
    pub range_key_attribute: String,

    /// Attribute holding the 64-bit index value of each point
    #[serde(default = "GeoConfig::default_index_attribute")]
    pub index_attribute: String,

    /// Store-side index sorted by `index_attribute` within a partition
    #[serde(default = "GeoConfig::default_index_name")]
    pub index_name: String,

    /// Attribute holding the GeoJSON encoding of the point
    #[serde(default = "GeoConfig::default_point_attribute")]
    pub point_attribute: String,

    /// Partition key length N (1-31). One partition spans `2^(64 - 2N)` index values.
    #[serde(default = "GeoConfig::default_partition_key_length")]
    pub partition_key_length: u8,

    /// Worker pool size. `None` uses the available parallelism.
    #[serde(default)]
    pub worker_threads: Option<usize>,

    #[serde(default)]
    pub covering: CoveringConfig,
}

impl GeoConfig {
    fn default_table_name() -> String {
        "geo-table".to_string()
    }

    fn default_partition_key_attribute() -> String {
        "hashKey".to_string()
    }

    fn default_range_key_attribute() -> String {
        "rangeKey".to_string()
    }

    fn default_index_attribute() -> String {
        "geohash".to_string()
    }

    fn default_index_name() -> String {
        "geohash-index".to_string()
    }

    fn default_point_attribute() -> String {
        "geoJson".to_string()
    }

    const fn default_partition_key_length() -> u8 {
        6
    }

    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    pub fn with_partition_key_length(mut self, length: u8) -> Self {
        self.partition_key_length = length;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_covering(mut self, covering: CoveringConfig) -> Self {
        self.covering = covering;
        self
    }

    pub fn with_index_attribute(mut self, name: impl Into<String>) -> Self {
        self.index_attribute = name.into();
        self
    }

    pub fn with_point_attribute(mut self, name: impl Into<String>) -> Self {
        self.point_attribute = name.into();
        self
    }

    /// Effective worker pool size.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Attributes owned by the index. They are written once and never updated.
    pub fn reserved_attributes(&self) -> [&str; 4] {
        [
            self.partition_key_attribute.as_str(),
            self.range_key_attribute.as_str(),
            self.index_attribute.as_str(),
            self.point_attribute.as_str(),
        ]
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(GeoError::InvalidConfig("table name cannot be empty".into()));
        }

        let reserved = self.reserved_attributes();
        for (i, name) in reserved.iter().enumerate() {
            if name.is_empty() {
                return Err(GeoError::InvalidConfig(
                    "attribute names cannot be empty".into(),
                ));
            }
            if reserved[..i].contains(name) {
                return Err(GeoError::InvalidConfig(format!(
                    "attribute name '{}' is used for more than one purpose",
                    name
                )));
            }
        }

        if !(1..=31).contains(&self.partition_key_length) {
            return Err(GeoError::InvalidConfig(format!(
                "partition key length must be between 1 and 31, got {}",
                self.partition_key_length
            )));
        }

        if self.worker_threads == Some(0) {
            return Err(GeoError::InvalidConfig(
                "worker thread count must be greater than zero".into(),
            ));
        }

        self.covering.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GeoError::InvalidConfig(format!("invalid JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| GeoError::InvalidConfig(format!("invalid TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format from the extension (`.toml` or `.json`).
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            GeoError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            table_name: Self::default_table_name(),
            partition_key_attribute: Self::default_partition_key_attribute(),
            range_key_attribute: Self::default_range_key_attribute(),
            index_attribute: Self::default_index_attribute(),
            index_name: Self::default_index_name(),
            point_attribute: Self::default_point_attribute(),
            partition_key_length: Self::default_partition_key_length(),
            worker_threads: None,
            covering: CoveringConfig::default(),
        }
    }
}
