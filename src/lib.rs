// src/lib.rs

//! nsscache - builds the flat files read by libnss-cache
//!
//! One cache file per NSS database (`passwd`, `shadow`, `group`) is filled
//! from a pluggable [`Source`] and published atomically, so the system's name
//! resolution never reads a partial file.
//!
//! # Architecture
//!
//! - Options: per-database [`CacheOption`]s are grouped by [`DatabaseName`]
//! - CacheMap: exactly one [`Cache`] per database, always all three
//! - Population: `passwd`, `shadow`, `group` in order, stopping at the first
//!   source failure
//! - Publication: temp file + chmod + fsync + rename per database, mode 0644
//!   for passwd and group, 0000 for shadow
//!
//! # Example
//!
//! ```no_run
//! use nsscache::{CacheMap, CacheOption, DatabaseName, FileSource, NamedOption, SortKey, WriteOptions};
//!
//! let mut caches = CacheMap::new(&[NamedOption::new(
//!     DatabaseName::Passwd,
//!     CacheOption::SortBy(SortKey::Name),
//! )]);
//! caches.fill(&mut FileSource::new("/srv/identity"))?;
//! caches.write_files(Some(&WriteOptions::new("", "cache")))?;
//! # Ok::<(), nsscache::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod database;
mod error;
pub mod filesystem;
pub mod map;
pub mod publish;
pub mod source;

pub use cache::{Cache, CacheError, CacheOption, Entry, GroupEntry, PasswdEntry, ShadowEntry, SortKey};
pub use config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
pub use database::DatabaseName;
pub use error::{Error, Result};
pub use filesystem::{OsFs, PublishError, StagingFs, replace_atomic};
pub use map::{CacheMap, NamedOption, group_options};
pub use publish::{PublishReport, PublishedFile, Publisher, WriteOptions};
pub use source::{FileSource, Source, SourceError};
