// src/source/files.rs

//! Source backed by flat `passwd`, `shadow` and `group` files
//!
//! Useful for publishing caches from a staging tree (an exported directory
//! dump, a chroot's `/etc`, test fixtures).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use super::{Source, SourceError};
use crate::cache::{Cache, Entry, GroupEntry, ParseEntryError, PasswdEntry, ShadowEntry};
use crate::database::DatabaseName;

/// Reads records from `<root>/passwd`, `<root>/shadow` and `<root>/group`
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the source file for a database
    pub fn path(&self, database: DatabaseName) -> PathBuf {
        self.root.join(database.name())
    }

    fn load<T>(&self, database: DatabaseName, cache: &mut Cache) -> Result<(), SourceError>
    where
        T: FromStr<Err = ParseEntryError> + Into<Entry>,
    {
        let path = self.path(database);
        let content = fs::read_to_string(&path)?;

        let mut count = 0;
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry: T = line.parse().map_err(|e: ParseEntryError| SourceError::Malformed {
                database,
                line: idx + 1,
                reason: e.to_string(),
            })?;
            cache.add(entry);
            count += 1;
        }

        debug!("Loaded {} {} records from {}", count, database, path.display());
        Ok(())
    }
}

impl Source for FileSource {
    fn fill_passwd_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.load::<PasswdEntry>(DatabaseName::Passwd, cache)
    }

    fn fill_shadow_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.load::<ShadowEntry>(DatabaseName::Shadow, cache)
    }

    fn fill_group_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.load::<GroupEntry>(DatabaseName::Group, cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_all_databases() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("passwd"),
            "# managed elsewhere\nroot:x:0:0:root:/root:/bin/bash\n\nalice:x:1000:1000::/home/alice:/bin/zsh\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("shadow"), "root:*:19000:0:99999:7:::\n").unwrap();
        fs::write(temp_dir.path().join("group"), "wheel:x:10:alice\n").unwrap();

        let mut source = FileSource::new(temp_dir.path());

        let mut passwd = Cache::new(DatabaseName::Passwd);
        source.fill_passwd_cache(&mut passwd).unwrap();
        assert_eq!(passwd.len(), 2);
        assert_eq!(passwd.entries()[1].name(), "alice");

        let mut shadow = Cache::new(DatabaseName::Shadow);
        source.fill_shadow_cache(&mut shadow).unwrap();
        assert_eq!(shadow.len(), 1);

        let mut group = Cache::new(DatabaseName::Group);
        source.fill_group_cache(&mut group).unwrap();
        assert_eq!(
            group.entries()[0],
            Entry::Group(GroupEntry::new("wheel", 10).with_members(["alice"]))
        );
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("passwd"),
            "root:x:0:0:root:/root:/bin/bash\nbroken:x:notanumber:0:::\n",
        )
        .unwrap();

        let mut source = FileSource::new(temp_dir.path());
        let err = source.fill_passwd_cache(&mut Cache::new(DatabaseName::Passwd)).unwrap_err();
        match err {
            SourceError::Malformed { database, line, .. } => {
                assert_eq!(database, DatabaseName::Passwd);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = FileSource::new(temp_dir.path());
        let err = source.fill_group_cache(&mut Cache::new(DatabaseName::Group)).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
