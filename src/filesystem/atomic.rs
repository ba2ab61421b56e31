// src/filesystem/atomic.rs

//! Atomic file replacement
//!
//! A reader of the destination path sees either the complete old file or the
//! complete new one, never a truncated or missing file:
//!
//! 1. write the full content to a temporary file in the destination directory
//! 2. set the final permission bits on the temporary file
//! 3. fsync the temporary file
//! 4. rename it over the destination
//!
//! The temporary file lives next to the destination so the rename never
//! crosses a filesystem boundary. If any step fails the temporary file is
//! removed and the destination is left untouched.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::cache::CacheError;

/// Errors produced while publishing one cache file
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] CacheError),

    #[error("creating temporary file failed: {0}")]
    CreateTemp(#[source] io::Error),

    #[error("setting permissions failed: {0}")]
    SetPermissions(#[source] io::Error),

    #[error("syncing temporary file failed: {0}")]
    Sync(#[source] io::Error),

    #[error("renaming into place failed: {0}")]
    Rename(#[source] io::Error),
}

impl PublishError {
    /// Name of the publication step that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Serialize(_) => "serialize",
            Self::CreateTemp(_) => "create-temp",
            Self::SetPermissions(_) => "set-permissions",
            Self::Sync(_) => "sync",
            Self::Rename(_) => "rename",
        }
    }
}

/// The filesystem operations atomic replacement is built from
///
/// `Staged` is a written-but-invisible file. Dropping it without calling
/// [`StagingFs::commit`] must discard it.
pub trait StagingFs {
    type Staged;

    /// Create a temporary file in `dir` whose name starts with `prefix` and
    /// write `content` to it
    fn stage(&self, dir: &Path, prefix: &str, content: &[u8]) -> io::Result<Self::Staged>;

    /// Set the permission bits of the staged file
    fn set_mode(&self, staged: &mut Self::Staged, mode: u32) -> io::Result<()>;

    /// Flush the staged file to durable storage
    fn sync(&self, staged: &mut Self::Staged) -> io::Result<()>;

    /// Rename the staged file over `dest` in one step
    fn commit(&self, staged: Self::Staged, dest: &Path) -> io::Result<()>;
}

impl<F: StagingFs + ?Sized> StagingFs for &F {
    type Staged = F::Staged;

    fn stage(&self, dir: &Path, prefix: &str, content: &[u8]) -> io::Result<Self::Staged> {
        (**self).stage(dir, prefix, content)
    }

    fn set_mode(&self, staged: &mut Self::Staged, mode: u32) -> io::Result<()> {
        (**self).set_mode(staged, mode)
    }

    fn sync(&self, staged: &mut Self::Staged) -> io::Result<()> {
        (**self).sync(staged)
    }

    fn commit(&self, staged: Self::Staged, dest: &Path) -> io::Result<()> {
        (**self).commit(staged, dest)
    }
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl StagingFs for OsFs {
    type Staged = NamedTempFile;

    fn stage(&self, dir: &Path, prefix: &str, content: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
        file.write_all(content)?;
        file.flush()?;
        Ok(file)
    }

    fn set_mode(&self, staged: &mut NamedTempFile, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = (staged, mode);
        Ok(())
    }

    fn sync(&self, staged: &mut NamedTempFile) -> io::Result<()> {
        staged.as_file().sync_all()
    }

    fn commit(&self, staged: NamedTempFile, dest: &Path) -> io::Result<()> {
        staged.persist(dest).map_err(|e| e.error)?;

        // Persist the directory entry; not every filesystem supports fsync on
        // directories, so errors are ignored
        if let Some(parent) = dest.parent()
            && let Ok(dir) = fs::File::open(parent)
        {
            let _ = dir.sync_all();
        }
        Ok(())
    }
}

/// Atomically replace `dest` with `content`, leaving it with exactly `mode`
pub fn replace_atomic<F: StagingFs + ?Sized>(
    staging: &F,
    dest: &Path,
    content: &[u8],
    mode: u32,
) -> Result<(), PublishError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = dest.file_name().ok_or_else(|| {
        PublishError::CreateTemp(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("destination has no file name: {}", dest.display()),
        ))
    })?;
    let prefix = format!(".{}.", file_name.to_string_lossy());

    let mut staged = staging
        .stage(dir, &prefix, content)
        .map_err(PublishError::CreateTemp)?;
    staging
        .set_mode(&mut staged, mode)
        .map_err(PublishError::SetPermissions)?;
    staging.sync(&mut staged).map_err(PublishError::Sync)?;
    staging.commit(staged, dest).map_err(PublishError::Rename)?;

    debug!(
        "Replaced {} ({} bytes, mode {:o})",
        dest.display(),
        content.len(),
        mode
    );
    Ok(())
}
