// src/config.rs

//! Configuration file for the `nsscache` command
//!
//! # Example nsscache.toml
//!
//! ```toml
//! [output]
//! directory = "/etc"
//! extension = "cache"
//!
//! # Directory holding passwd, shadow and group source files
//! [source]
//! root = "/var/lib/nsscache/source"
//!
//! [passwd]
//! sort = "name"
//! min_id = 1000
//!
//! [group]
//! sort = "id"
//! ```
//!
//! Every section is optional; missing output fields fall back to `/etc` and
//! `cache` when the files are written.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::{CacheOption, SortKey};
use crate::database::DatabaseName;
use crate::map::NamedOption;
use crate::publish::WriteOptions;

/// Default path for the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nsscache.toml";

/// Errors that can occur when loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the cache files are written
    pub output: WriteOptions,

    /// Where records are read from
    pub source: SourceConfig,

    pub passwd: DatabaseConfig,
    pub shadow: DatabaseConfig,
    pub group: DatabaseConfig,
}

/// Source section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory containing `passwd`, `shadow` and `group` files
    pub root: Option<PathBuf>,
}

/// Per-database section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Order of the written records (insertion order when unset)
    pub sort: Option<SortKey>,

    /// Lowest uid/gid to include
    pub min_id: Option<u32>,

    /// Highest uid/gid to include
    pub max_id: Option<u32>,
}

impl DatabaseConfig {
    /// Cache options described by this section
    pub fn options(&self) -> Vec<CacheOption> {
        let mut opts = Vec::new();
        if let Some(key) = self.sort {
            opts.push(CacheOption::SortBy(key));
        }
        if let Some(min) = self.min_id {
            opts.push(CacheOption::MinId(min));
        }
        if let Some(max) = self.max_id {
            opts.push(CacheOption::MaxId(max));
        }
        opts
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Section for one database
    pub fn database(&self, database: DatabaseName) -> &DatabaseConfig {
        match database {
            DatabaseName::Passwd => &self.passwd,
            DatabaseName::Shadow => &self.shadow,
            DatabaseName::Group => &self.group,
        }
    }

    /// All cache options, in database order
    pub fn options(&self) -> Vec<NamedOption> {
        DatabaseName::ALL
            .into_iter()
            .flat_map(|db| {
                self.database(db)
                    .options()
                    .into_iter()
                    .map(move |opt| NamedOption::new(db, opt))
            })
            .collect()
    }
}
