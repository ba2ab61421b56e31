// src/cache/mod.rs

//! In-memory record sets for the cache files
//!
//! A [`Cache`] holds the records of one database. Sources append to it during
//! population; the publisher reads it back through [`Cache::to_bytes`], which
//! applies the cache's options (ordering, id range) and renders one line per
//! record. Serialization is deterministic: the same records and options always
//! produce the same bytes. A record of the wrong kind (a group in the passwd
//! cache) is rejected at serialization.

mod entry;

pub use entry::{Entry, GroupEntry, ParseEntryError, PasswdEntry, ShadowEntry};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::DatabaseName;

/// Ordering of the serialized records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Byte-wise order of the account or group name
    Name,
    /// Numeric uid/gid, ties broken by name (shadow records sort by name)
    Id,
}

/// Per-database configuration routed to a cache at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOption {
    /// Sort records before writing; the last `SortBy` given wins
    SortBy(SortKey),
    /// Drop records whose id is below this value
    MinId(u32),
    /// Drop records whose id is above this value
    MaxId(u32),
}

/// Errors produced while serializing a cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// A field would break the colon-separated line format
    #[error("invalid {field} for entry '{entry}': {value:?}")]
    InvalidField {
        entry: String,
        field: &'static str,
        value: String,
    },

    /// A record does not belong to the cache's database
    #[error("{found} entry '{entry}' in {expected} cache")]
    WrongDatabase {
        entry: String,
        expected: DatabaseName,
        found: DatabaseName,
    },
}

/// Records of one NSS database
#[derive(Debug, Clone)]
pub struct Cache {
    database: DatabaseName,
    options: Vec<CacheOption>,
    entries: Vec<Entry>,
    populated: bool,
}

impl Cache {
    /// Create an empty cache for `database` without options
    pub fn new(database: DatabaseName) -> Self {
        Self {
            database,
            options: Vec::new(),
            entries: Vec::new(),
            populated: false,
        }
    }

    /// Set the options, replacing any given before
    pub fn with_options(mut self, options: impl IntoIterator<Item = CacheOption>) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    pub fn database(&self) -> DatabaseName {
        self.database
    }

    /// Options this cache was created with, in the order they were given
    pub fn options(&self) -> &[CacheOption] {
        &self.options
    }

    /// Append a record
    ///
    /// Adding records does not make the cache publishable; see
    /// [`Cache::mark_populated`].
    pub fn add(&mut self, entry: impl Into<Entry>) {
        self.entries.push(entry.into());
    }

    /// Records in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a source has successfully filled this cache
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Mark the cache as filled so it becomes eligible for publication
    ///
    /// [`CacheMap::fill`](crate::CacheMap::fill) does this after each
    /// successful fill. Caches filled by hand must call it themselves, or the
    /// publisher skips them.
    pub fn mark_populated(&mut self) {
        self.populated = true;
    }

    fn sort_key(&self) -> Option<SortKey> {
        self.options.iter().rev().find_map(|opt| match opt {
            CacheOption::SortBy(key) => Some(*key),
            _ => None,
        })
    }

    fn in_range(&self, entry: &Entry) -> bool {
        let Some(id) = entry.id() else {
            return true;
        };
        self.options.iter().all(|opt| match *opt {
            CacheOption::MinId(min) => id >= min,
            CacheOption::MaxId(max) => id <= max,
            CacheOption::SortBy(_) => true,
        })
    }

    /// Records as they will be written: filtered by id range, then ordered
    pub fn selected(&self) -> Vec<&Entry> {
        let mut selected: Vec<&Entry> = self.entries.iter().filter(|e| self.in_range(e)).collect();

        // Stable sorts keep insertion order among equal keys
        match self.sort_key() {
            Some(SortKey::Name) => selected.sort_by(|a, b| a.name().cmp(b.name())),
            Some(SortKey::Id) => {
                selected.sort_by(|a, b| a.id().cmp(&b.id()).then_with(|| a.name().cmp(b.name())))
            }
            None => {}
        }

        selected
    }

    /// Serialize the cache into the exact bytes of its cache file
    ///
    /// Every record is checked against the cache's database, including those
    /// the id range would drop.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        if let Some(entry) = self.entries.iter().find(|e| e.database() != self.database) {
            return Err(CacheError::WrongDatabase {
                entry: entry.name().to_string(),
                expected: self.database,
                found: entry.database(),
            });
        }

        let mut buf = Vec::new();
        for entry in self.selected() {
            buf.extend_from_slice(entry.to_line()?.as_bytes());
        }
        Ok(buf)
    }
}

impl Extend<Entry> for Cache {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Cache {
        let mut cache = Cache::new(DatabaseName::Passwd);
        cache.add(PasswdEntry::new("zed", 1002, 100));
        cache.add(PasswdEntry::new("root", 0, 0));
        cache.add(PasswdEntry::new("alice", 1000, 100));
        cache
    }

    fn names(cache: &Cache) -> Vec<&str> {
        cache.selected().into_iter().map(Entry::name).collect()
    }

    #[test]
    fn test_new_cache_is_empty_and_unpopulated() {
        let cache = Cache::new(DatabaseName::Group).with_options([CacheOption::MinId(1000)]);
        assert_eq!(cache.database(), DatabaseName::Group);
        assert!(cache.is_empty());
        assert!(!cache.is_populated());
        assert_eq!(cache.options(), &[CacheOption::MinId(1000)]);
        assert!(cache.to_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_insertion_order_without_sort() {
        assert_eq!(names(&users()), vec!["zed", "root", "alice"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut cache = users();
        cache.options.push(CacheOption::SortBy(SortKey::Name));
        assert_eq!(names(&cache), vec!["alice", "root", "zed"]);
    }

    #[test]
    fn test_last_sort_option_wins() {
        let mut cache = users();
        cache.options = vec![
            CacheOption::SortBy(SortKey::Name),
            CacheOption::SortBy(SortKey::Id),
        ];
        assert_eq!(names(&cache), vec!["root", "alice", "zed"]);
    }

    #[test]
    fn test_id_range_filter() {
        let mut cache = users();
        cache.options = vec![CacheOption::MinId(1000), CacheOption::MaxId(1001)];
        assert_eq!(names(&cache), vec!["alice"]);
    }

    #[test]
    fn test_id_filter_keeps_shadow_entries() {
        let mut cache = Cache::new(DatabaseName::Shadow).with_options([CacheOption::MinId(1000)]);
        cache.add(ShadowEntry::new("root"));
        assert_eq!(cache.selected().len(), 1);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut cache = users();
        cache.options.push(CacheOption::SortBy(SortKey::Name));
        let first = cache.to_bytes().unwrap();
        let second = cache.to_bytes().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "alice:x:1000:100:::\nroot:x:0:0:::\nzed:x:1002:100:::\n"
        );
    }

    #[test]
    fn test_invalid_field_fails_serialization() {
        let mut cache = users();
        cache.add(PasswdEntry::new("bad", 1, 1).with_shell("/bin/sh\n"));
        let err = cache.to_bytes().unwrap_err();
        assert!(matches!(err, CacheError::InvalidField { field: "shell", .. }));
    }

    #[test]
    fn test_record_of_other_database_is_rejected() {
        let mut cache = users();
        cache.add(GroupEntry::new("wheel", 10));

        let err = cache.to_bytes().unwrap_err();
        match &err {
            CacheError::WrongDatabase {
                entry,
                expected,
                found,
            } => {
                assert_eq!(entry, "wheel");
                assert_eq!(*expected, DatabaseName::Passwd);
                assert_eq!(*found, DatabaseName::Group);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "group entry 'wheel' in passwd cache");
    }

    #[test]
    fn test_record_dropped_by_range_is_still_checked() {
        let mut cache = Cache::new(DatabaseName::Group).with_options([CacheOption::MaxId(10)]);
        cache.add(PasswdEntry::new("alice", 1000, 1000));
        assert!(matches!(
            cache.to_bytes(),
            Err(CacheError::WrongDatabase { .. })
        ));
    }

    #[test]
    fn test_extend() {
        let mut cache = Cache::new(DatabaseName::Group);
        cache.extend(vec![
            Entry::from(GroupEntry::new("wheel", 10)),
            Entry::from(GroupEntry::new("users", 100)),
        ]);
        assert_eq!(cache.len(), 2);
    }
}
