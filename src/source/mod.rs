// src/source/mod.rs

//! Upstream identity providers
//!
//! A [`Source`] knows how to fill the cache of each database. Directory
//! service connectors live outside this crate and implement the trait;
//! [`FileSource`] reads flat files and is what the CLI uses.

mod files;

pub use files::FileSource;

use std::io;
use thiserror::Error;

use crate::cache::Cache;
use crate::database::DatabaseName;

/// Errors reported by a source while filling a cache
#[derive(Error, Debug)]
pub enum SourceError {
    /// The upstream provider failed (timeout, refused connection, ...)
    #[error("{0}")]
    Upstream(String),

    /// Reading source data failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A source record could not be parsed
    #[error("malformed {database} record at line {line}: {reason}")]
    Malformed {
        database: DatabaseName,
        line: usize,
        reason: String,
    },
}

impl SourceError {
    /// Convenience constructor for upstream failures
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}

/// A provider able to populate the cache of every database
pub trait Source {
    fn fill_passwd_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError>;

    fn fill_shadow_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError>;

    fn fill_group_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError>;

    /// Dispatch to the fill operation matching `database`
    fn fill(&mut self, database: DatabaseName, cache: &mut Cache) -> Result<(), SourceError> {
        match database {
            DatabaseName::Passwd => self.fill_passwd_cache(cache),
            DatabaseName::Shadow => self.fill_shadow_cache(cache),
            DatabaseName::Group => self.fill_group_cache(cache),
        }
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn fill_passwd_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        (**self).fill_passwd_cache(cache)
    }

    fn fill_shadow_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        (**self).fill_shadow_cache(cache)
    }

    fn fill_group_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        (**self).fill_group_cache(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{PasswdEntry, ShadowEntry};

    struct Fixed;

    impl Source for Fixed {
        fn fill_passwd_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
            cache.add(PasswdEntry::new("alice", 1000, 1000));
            Ok(())
        }

        fn fill_shadow_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
            cache.add(ShadowEntry::new("alice"));
            Ok(())
        }

        fn fill_group_cache(&mut self, _cache: &mut Cache) -> Result<(), SourceError> {
            Err(SourceError::upstream("group lookup refused"))
        }
    }

    #[test]
    fn test_fill_dispatches_by_database() {
        let mut source = Fixed;
        let mut cache = Cache::new(DatabaseName::Passwd);
        source.fill(DatabaseName::Passwd, &mut cache).unwrap();
        assert_eq!(cache.entries()[0].id(), Some(1000));

        let mut cache = Cache::new(DatabaseName::Shadow);
        source.fill(DatabaseName::Shadow, &mut cache).unwrap();
        assert_eq!(cache.entries()[0].id(), None);

        let mut cache = Cache::new(DatabaseName::Group);
        let err = source.fill(DatabaseName::Group, &mut cache).unwrap_err();
        assert_eq!(err.to_string(), "group lookup refused");
    }

    #[test]
    fn test_boxed_source() {
        let mut source: Box<dyn Source> = Box::new(Fixed);
        let mut cache = Cache::new(DatabaseName::Passwd);
        source.fill(DatabaseName::Passwd, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
    }
}
