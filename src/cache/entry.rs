// src/cache/entry.rs

//! Typed passwd, shadow and group records
//!
//! Each record serializes to exactly one line of the classic colon-separated
//! format that `/etc/passwd`, `/etc/shadow` and `/etc/group` use, which is also
//! what libnss-cache reads from its `.cache` files.

use std::fmt;
use std::str::FromStr;

use super::CacheError;
use crate::database::DatabaseName;

/// A `passwd(5)` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    pub name: String,
    pub passwd: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub dir: String,
    pub shell: String,
}

impl PasswdEntry {
    /// Create an entry with the conventional `x` password placeholder
    pub fn new(name: impl Into<String>, uid: u32, gid: u32) -> Self {
        Self {
            name: name.into(),
            passwd: "x".to_string(),
            uid,
            gid,
            gecos: String::new(),
            dir: String::new(),
            shell: String::new(),
        }
    }

    pub fn with_gecos(mut self, gecos: impl Into<String>) -> Self {
        self.gecos = gecos.into();
        self
    }

    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

/// A `shadow(5)` record
///
/// Numeric aging fields are optional; unset fields serialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowEntry {
    pub name: String,
    pub passwd: String,
    pub lastchg: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub warn: Option<i64>,
    pub inact: Option<i64>,
    pub expire: Option<i64>,
    pub flag: Option<u64>,
}

impl ShadowEntry {
    /// Create an entry with a locked (`*`) password and no aging information
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passwd: "*".to_string(),
            ..Default::default()
        }
    }

    pub fn with_passwd(mut self, passwd: impl Into<String>) -> Self {
        self.passwd = passwd.into();
        self
    }
}

/// A `group(5)` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub passwd: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl GroupEntry {
    pub fn new(name: impl Into<String>, gid: u32) -> Self {
        Self {
            name: name.into(),
            passwd: "x".to_string(),
            gid,
            members: Vec::new(),
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }
}

/// Any record a cache can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Passwd(PasswdEntry),
    Shadow(ShadowEntry),
    Group(GroupEntry),
}

impl Entry {
    /// Account or group name
    pub fn name(&self) -> &str {
        match self {
            Self::Passwd(e) => &e.name,
            Self::Shadow(e) => &e.name,
            Self::Group(e) => &e.name,
        }
    }

    /// Database this kind of record belongs to
    pub fn database(&self) -> DatabaseName {
        match self {
            Self::Passwd(_) => DatabaseName::Passwd,
            Self::Shadow(_) => DatabaseName::Shadow,
            Self::Group(_) => DatabaseName::Group,
        }
    }

    /// Numeric id (uid or gid); shadow records have none
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Passwd(e) => Some(e.uid),
            Self::Shadow(_) => None,
            Self::Group(e) => Some(e.gid),
        }
    }

    /// Render the record as one newline-terminated line
    ///
    /// Fails when a text field would corrupt the line structure.
    pub fn to_line(&self) -> Result<String, CacheError> {
        match self {
            Self::Passwd(e) => {
                check_name(&e.name)?;
                check_field(&e.name, "passwd", &e.passwd)?;
                check_field(&e.name, "gecos", &e.gecos)?;
                check_field(&e.name, "dir", &e.dir)?;
                check_field(&e.name, "shell", &e.shell)?;
                Ok(format!(
                    "{}:{}:{}:{}:{}:{}:{}\n",
                    e.name, e.passwd, e.uid, e.gid, e.gecos, e.dir, e.shell
                ))
            }
            Self::Shadow(e) => {
                check_name(&e.name)?;
                check_field(&e.name, "passwd", &e.passwd)?;
                Ok(format!(
                    "{}:{}:{}:{}:{}:{}:{}:{}:{}\n",
                    e.name,
                    e.passwd,
                    opt(e.lastchg),
                    opt(e.min),
                    opt(e.max),
                    opt(e.warn),
                    opt(e.inact),
                    opt(e.expire),
                    opt(e.flag),
                ))
            }
            Self::Group(e) => {
                check_name(&e.name)?;
                check_field(&e.name, "passwd", &e.passwd)?;
                for member in &e.members {
                    if member.is_empty() || member.contains(',') {
                        return Err(CacheError::InvalidField {
                            entry: e.name.clone(),
                            field: "members",
                            value: member.clone(),
                        });
                    }
                    check_field(&e.name, "members", member)?;
                }
                Ok(format!(
                    "{}:{}:{}:{}\n",
                    e.name,
                    e.passwd,
                    e.gid,
                    e.members.join(",")
                ))
            }
        }
    }
}

impl From<PasswdEntry> for Entry {
    fn from(e: PasswdEntry) -> Self {
        Self::Passwd(e)
    }
}

impl From<ShadowEntry> for Entry {
    fn from(e: ShadowEntry) -> Self {
        Self::Shadow(e)
    }
}

impl From<GroupEntry> for Entry {
    fn from(e: GroupEntry) -> Self {
        Self::Group(e)
    }
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn check_name(name: &str) -> Result<(), CacheError> {
    if name.is_empty() {
        return Err(CacheError::InvalidField {
            entry: String::new(),
            field: "name",
            value: String::new(),
        });
    }
    check_field(name, "name", name)
}

fn check_field(entry: &str, field: &'static str, value: &str) -> Result<(), CacheError> {
    if value.contains([':', '\n']) {
        return Err(CacheError::InvalidField {
            entry: entry.to_string(),
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A line that does not parse as the expected record type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseEntryError(String);

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, ParseEntryError> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(':').collect();
    if fields.len() != expected {
        return Err(ParseEntryError(format!(
            "expected {} fields, got {}",
            expected,
            fields.len()
        )));
    }
    if fields[0].is_empty() {
        return Err(ParseEntryError("empty name".to_string()));
    }
    Ok(fields)
}

fn parse_id(field: &str, what: &str) -> Result<u32, ParseEntryError> {
    field
        .parse()
        .map_err(|_| ParseEntryError(format!("invalid {}: {:?}", what, field)))
}

fn parse_opt<T: FromStr>(field: &str, what: &str) -> Result<Option<T>, ParseEntryError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse()
        .map(Some)
        .map_err(|_| ParseEntryError(format!("invalid {}: {:?}", what, field)))
}

impl FromStr for PasswdEntry {
    type Err = ParseEntryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let f = split_fields(line, 7)?;
        Ok(Self {
            name: f[0].to_string(),
            passwd: f[1].to_string(),
            uid: parse_id(f[2], "uid")?,
            gid: parse_id(f[3], "gid")?,
            gecos: f[4].to_string(),
            dir: f[5].to_string(),
            shell: f[6].to_string(),
        })
    }
}

impl FromStr for ShadowEntry {
    type Err = ParseEntryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let f = split_fields(line, 9)?;
        Ok(Self {
            name: f[0].to_string(),
            passwd: f[1].to_string(),
            lastchg: parse_opt(f[2], "lastchg")?,
            min: parse_opt(f[3], "min")?,
            max: parse_opt(f[4], "max")?,
            warn: parse_opt(f[5], "warn")?,
            inact: parse_opt(f[6], "inact")?,
            expire: parse_opt(f[7], "expire")?,
            flag: parse_opt(f[8], "flag")?,
        })
    }
}

impl FromStr for GroupEntry {
    type Err = ParseEntryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let f = split_fields(line, 4)?;
        let members = if f[3].is_empty() {
            Vec::new()
        } else {
            f[3].split(',').map(str::to_string).collect()
        };
        Ok(Self {
            name: f[0].to_string(),
            passwd: f[1].to_string(),
            gid: parse_id(f[2], "gid")?,
            members,
        })
    }
}
