// src/error.rs

//! Crate-level error type
//!
//! Each phase annotates the collaborator error with the database it was
//! processing, so callers can tell a failed fill of `shadow` from a failed
//! rename of `group.cache`.

use std::path::PathBuf;
use thiserror::Error;

use crate::database::DatabaseName;
use crate::filesystem::PublishError;
use crate::source::SourceError;

/// Errors returned by the cache pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// The source failed to populate a database's cache
    #[error("failed to fill {database} cache: {source}")]
    Fill {
        database: DatabaseName,
        source: SourceError,
    },

    /// Writing a database's cache file failed
    #[error("failed to publish {database} cache to {}: {source}", .path.display())]
    Publish {
        database: DatabaseName,
        path: PathBuf,
        source: PublishError,
    },
}

impl Error {
    /// Database being processed when the error occurred
    pub fn database(&self) -> DatabaseName {
        match self {
            Self::Fill { database, .. } | Self::Publish { database, .. } => *database,
        }
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
