// src/publish.rs

//! Publication of cache files
//!
//! Each populated cache is serialized and atomically swapped into
//! `<directory>/<database>.<extension>` with the database's permission mode
//! (0644 for passwd and group, 0000 for shadow).
//!
//! Publication stops at the first failure. Files already replaced keep their
//! new content and files not yet reached keep whatever they had before; there
//! is no rollback across databases. Two concurrent runs against the same
//! directory are not serialized against each other: every individual file
//! replacement is atomic, and the last rename of a given file wins.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::database::DatabaseName;
use crate::error::{Error, Result};
use crate::filesystem::{OsFs, PublishError, StagingFs, replace_atomic};
use crate::map::CacheMap;

/// Default directory the cache files are written to
pub const DEFAULT_DIRECTORY: &str = "/etc";

/// Default file extension of the cache files
pub const DEFAULT_EXTENSION: &str = "cache";

/// Where cache files are written
///
/// Empty fields mean "unset" and are filled in field by field by
/// [`WriteOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Output directory
    pub directory: PathBuf,
    /// File extension, without the leading dot
    pub extension: String,
}

impl WriteOptions {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    /// `/etc` and `cache`
    pub fn defaults() -> Self {
        Self::new(DEFAULT_DIRECTORY, DEFAULT_EXTENSION)
    }

    /// Fill every empty field from `defaults`, leaving `self` untouched
    pub fn resolve(&self, defaults: &WriteOptions) -> WriteOptions {
        WriteOptions {
            directory: if self.directory.as_os_str().is_empty() {
                defaults.directory.clone()
            } else {
                self.directory.clone()
            },
            extension: if self.extension.is_empty() {
                defaults.extension.clone()
            } else {
                self.extension.clone()
            },
        }
    }

    /// Resolve optional caller options against [`WriteOptions::defaults`]
    pub fn resolved(options: Option<&WriteOptions>) -> WriteOptions {
        let defaults = Self::defaults();
        options.map_or_else(|| defaults.clone(), |opts| opts.resolve(&defaults))
    }

    /// Destination path of a database's cache file
    pub fn path(&self, database: DatabaseName) -> PathBuf {
        self.directory.join(database.file_name(&self.extension))
    }
}

/// A cache file written by [`Publisher::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    pub database: DatabaseName,
    pub path: PathBuf,
    pub bytes: usize,
    pub mode: u32,
}

/// Outcome of a successful publication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Files replaced, in database order
    pub published: Vec<PublishedFile>,
    /// Databases left alone because their cache was never populated
    pub skipped: Vec<DatabaseName>,
}

/// Writes the caches of a [`CacheMap`] to disk
pub struct Publisher<F: StagingFs = OsFs> {
    staging: F,
    options: WriteOptions,
}

impl Publisher<OsFs> {
    /// Publisher for the real filesystem
    pub fn new(options: Option<&WriteOptions>) -> Self {
        Self::with_fs(OsFs, options)
    }
}

impl<F: StagingFs> Publisher<F> {
    /// Publisher using a custom filesystem implementation
    pub fn with_fs(staging: F, options: Option<&WriteOptions>) -> Self {
        Self {
            staging,
            options: WriteOptions::resolved(options),
        }
    }

    /// Effective options after defaulting
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Destination path of a database's cache file
    pub fn path(&self, database: DatabaseName) -> PathBuf {
        self.options.path(database)
    }

    /// Publish every populated cache, in database order
    ///
    /// A cache that was never filled (for example because population failed
    /// before reaching it) is skipped so its previous file stays in place
    /// instead of being replaced by an empty one. Only
    /// [`CacheMap::fill`] or [`Cache::mark_populated`](crate::Cache::mark_populated)
    /// makes a cache publishable; records added by hand are not enough.
    pub fn publish(&self, caches: &CacheMap) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for (database, cache) in caches.iter() {
            let path = self.path(database);

            if !cache.is_populated() {
                warn!(
                    "Skipping {}: {} cache was not populated",
                    path.display(),
                    database
                );
                report.skipped.push(database);
                continue;
            }

            let mode = database.mode();
            let annotate = |source: PublishError| Error::Publish {
                database,
                path: path.clone(),
                source,
            };

            let content = cache
                .to_bytes()
                .map_err(|e| annotate(PublishError::Serialize(e)))?;
            debug!("Serialized {} cache: {} bytes", database, content.len());
            replace_atomic(&self.staging, &path, &content, mode).map_err(annotate)?;

            info!(
                "Published {} ({} entries, {} bytes, mode {:o})",
                path.display(),
                cache.selected().len(),
                content.len(),
                mode
            );
            report.published.push(PublishedFile {
                database,
                path,
                bytes: content.len(),
                mode,
            });
        }

        if report.published.is_empty() {
            warn!("No cache was populated, nothing published");
        }

        Ok(report)
    }
}
