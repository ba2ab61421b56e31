// src/database.rs

//! The identity databases served by libnss-cache
//!
//! The set is fixed and its order (`passwd`, `shadow`, `group`) drives every
//! iteration in the crate: option grouping, population and publication.

use std::fmt;
use std::str::FromStr;

/// One of the NSS databases this crate builds cache files for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatabaseName {
    /// User accounts (`passwd.cache`)
    Passwd,
    /// Password hashes and aging (`shadow.cache`)
    Shadow,
    /// Groups and their members (`group.cache`)
    Group,
}

impl DatabaseName {
    /// All databases, in processing order
    pub const ALL: [DatabaseName; 3] = [Self::Passwd, Self::Shadow, Self::Group];

    /// Get the database name as a string
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Passwd => "passwd",
            Self::Shadow => "shadow",
            Self::Group => "group",
        }
    }

    /// Permission bits of the published cache file
    ///
    /// Shadow carries credential hashes and gets no access bits at all;
    /// passwd and group are world-readable like their `/etc` counterparts.
    #[inline]
    pub const fn mode(&self) -> u32 {
        match self {
            Self::Shadow => 0o000,
            Self::Passwd | Self::Group => 0o644,
        }
    }

    /// File name of the cache file for a given extension (e.g. `passwd.cache`)
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.name(), extension)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DatabaseName {
    type Err = UnknownDatabase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passwd" => Ok(Self::Passwd),
            "shadow" => Ok(Self::Shadow),
            "group" => Ok(Self::Group),
            _ => Err(UnknownDatabase(s.to_string())),
        }
    }
}

/// A database name outside the fixed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown database: {0} (expected passwd, shadow or group)")]
pub struct UnknownDatabase(pub String);
