// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use nsscache::{Cache, DatabaseName, GroupEntry, PasswdEntry, ShadowEntry, Source, SourceError, StagingFs};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source with fixed records whose fill operations can be made to fail.
///
/// Every call is recorded, so tests can check which operations ran.
#[derive(Default)]
pub struct ScriptedSource {
    pub calls: Vec<DatabaseName>,
    pub failures: BTreeMap<DatabaseName, String>,
}

impl ScriptedSource {
    pub fn failing(database: DatabaseName, msg: &str) -> Self {
        let mut source = Self::default();
        source.failures.insert(database, msg.to_string());
        source
    }

    fn call(&mut self, database: DatabaseName) -> Result<(), SourceError> {
        self.calls.push(database);
        match self.failures.get(&database) {
            Some(msg) => Err(SourceError::upstream(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Source for ScriptedSource {
    fn fill_passwd_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.call(DatabaseName::Passwd)?;
        cache.add(
            PasswdEntry::new("root", 0, 0)
                .with_gecos("root")
                .with_dir("/root")
                .with_shell("/bin/bash"),
        );
        cache.add(
            PasswdEntry::new("alice", 1000, 1000)
                .with_gecos("Alice")
                .with_dir("/home/alice")
                .with_shell("/bin/zsh"),
        );
        Ok(())
    }

    fn fill_shadow_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.call(DatabaseName::Shadow)?;
        cache.add(ShadowEntry::new("root"));
        cache.add(ShadowEntry::new("alice").with_passwd("$6$salt$hash"));
        Ok(())
    }

    fn fill_group_cache(&mut self, cache: &mut Cache) -> Result<(), SourceError> {
        self.call(DatabaseName::Group)?;
        cache.add(GroupEntry::new("root", 0));
        cache.add(GroupEntry::new("wheel", 10).with_members(["alice"]));
        Ok(())
    }
}

/// Expected passwd.cache content for [`ScriptedSource`] without options
pub const PASSWD_CONTENT: &str =
    "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:Alice:/home/alice:/bin/zsh\n";

/// Expected shadow.cache content for [`ScriptedSource`] without options
pub const SHADOW_CONTENT: &str = "root:*:::::::\nalice:$6$salt$hash:::::::\n";

/// Expected group.cache content for [`ScriptedSource`] without options
pub const GROUP_CONTENT: &str = "root:x:0:\nwheel:x:10:alice\n";

/// Permission bits of a file
#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

/// Read a file whose mode may deny its owner read access, such as a
/// published shadow cache (mode 0000) when not running as root.
///
/// The mode is opened up for the read and restored afterwards.
#[cfg(unix)]
pub fn read_restricted(path: &Path) -> Vec<u8> {
    use std::os::unix::fs::PermissionsExt;
    let mode = mode_of(path);
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o600)).unwrap();
    let content = fs::read(path).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    content
}

#[cfg(not(unix))]
pub fn read_restricted(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

/// Sorted file names in a directory
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// In-memory filesystem that fails to commit one destination.
#[derive(Default)]
pub struct FlakyFs {
    pub files: RefCell<BTreeMap<PathBuf, (Vec<u8>, u32)>>,
    pub fail_commit_for: Option<PathBuf>,
}

pub struct Staged {
    content: Vec<u8>,
    mode: u32,
}

impl StagingFs for FlakyFs {
    type Staged = Staged;

    fn stage(&self, _dir: &Path, _prefix: &str, content: &[u8]) -> io::Result<Staged> {
        Ok(Staged {
            content: content.to_vec(),
            mode: 0o600,
        })
    }

    fn set_mode(&self, staged: &mut Staged, mode: u32) -> io::Result<()> {
        staged.mode = mode;
        Ok(())
    }

    fn sync(&self, _staged: &mut Staged) -> io::Result<()> {
        Ok(())
    }

    fn commit(&self, staged: Staged, dest: &Path) -> io::Result<()> {
        if self.fail_commit_for.as_deref() == Some(dest) {
            return Err(io::Error::other("injected rename failure"));
        }
        self.files
            .borrow_mut()
            .insert(dest.to_path_buf(), (staged.content, staged.mode));
        Ok(())
    }
}
