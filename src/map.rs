// src/map.rs

//! The set of caches built in one run
//!
//! A [`CacheMap`] always holds exactly one [`Cache`] per database. It is built
//! from grouped options, filled from a [`Source`] and then written out with
//! [`CacheMap::write_files`].
//!
//! # Pipeline
//!
//! ```text
//! [NamedOption] -> group_options -> CacheMap::new -> fill(Source) -> write_files
//! ```

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheOption};
use crate::database::DatabaseName;
use crate::error::{Error, Result};
use crate::publish::{PublishReport, Publisher, WriteOptions};
use crate::source::Source;

/// A cache option addressed to one database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedOption {
    pub database: DatabaseName,
    pub option: CacheOption,
}

impl NamedOption {
    pub fn new(database: DatabaseName, option: CacheOption) -> Self {
        Self { database, option }
    }
}

/// Group options by database, keeping the relative order within each group
pub fn group_options(options: &[NamedOption]) -> BTreeMap<DatabaseName, Vec<CacheOption>> {
    let mut grouped: BTreeMap<DatabaseName, Vec<CacheOption>> = BTreeMap::new();
    for opt in options {
        grouped.entry(opt.database).or_default().push(opt.option);
    }
    grouped
}

/// One cache per database
#[derive(Debug, Clone)]
pub struct CacheMap {
    passwd: Cache,
    shadow: Cache,
    group: Cache,
}

impl CacheMap {
    /// Build a cache for every database from the options addressed to it
    ///
    /// Databases without options get a cache with no options.
    pub fn new(options: &[NamedOption]) -> Self {
        let mut grouped = group_options(options);
        let mut take = |database: DatabaseName| {
            let opts = grouped.remove(&database).unwrap_or_default();
            debug!("Creating {} cache with {} option(s)", database, opts.len());
            Cache::new(database).with_options(opts)
        };

        Self {
            passwd: take(DatabaseName::Passwd),
            shadow: take(DatabaseName::Shadow),
            group: take(DatabaseName::Group),
        }
    }

    pub fn get(&self, database: DatabaseName) -> &Cache {
        match database {
            DatabaseName::Passwd => &self.passwd,
            DatabaseName::Shadow => &self.shadow,
            DatabaseName::Group => &self.group,
        }
    }

    pub fn get_mut(&mut self, database: DatabaseName) -> &mut Cache {
        match database {
            DatabaseName::Passwd => &mut self.passwd,
            DatabaseName::Shadow => &mut self.shadow,
            DatabaseName::Group => &mut self.group,
        }
    }

    /// Caches in processing order
    pub fn iter(&self) -> impl Iterator<Item = (DatabaseName, &Cache)> {
        DatabaseName::ALL.into_iter().map(move |db| (db, self.get(db)))
    }

    /// Fill every cache from `source`, in database order
    ///
    /// Stops at the first failure. Caches filled before the failure keep their
    /// records and stay marked as populated; later caches are not touched.
    pub fn fill<S: Source + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        for database in DatabaseName::ALL {
            let cache = self.get_mut(database);
            debug!("Filling {} cache", database);

            if let Err(e) = source.fill(database, cache) {
                warn!("Filling {} cache failed: {}", database, e);
                return Err(Error::Fill {
                    database,
                    source: e,
                });
            }

            cache.mark_populated();
            info!("Filled {} cache with {} entries", database, cache.len());
        }
        Ok(())
    }

    /// Write every populated cache to `<directory>/<database>.<extension>`
    ///
    /// Unset fields of `options` fall back to `/etc` and `cache`. Caches not
    /// marked as populated are skipped and listed in [`PublishReport::skipped`].
    pub fn write_files(&self, options: Option<&WriteOptions>) -> Result<PublishReport> {
        Publisher::new(options).publish(self)
    }
}

impl Default for CacheMap {
    fn default() -> Self {
        Self::new(&[])
    }
}
