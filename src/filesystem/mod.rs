// src/filesystem/mod.rs

//! Filesystem operations for publishing cache files
//!
//! The publisher never writes a cache file in place. Content goes through
//! [`replace_atomic`], which stages a temporary file next to the destination
//! and renames it into place. The individual steps sit behind [`StagingFs`]
//! so they can be exercised against an in-memory filesystem.

mod atomic;

pub use atomic::{OsFs, PublishError, StagingFs, replace_atomic};
