// src/commands.rs
//! Command handlers for the nsscache CLI

use anyhow::{Context, Result, anyhow};
use nsscache::{CacheMap, Config, DEFAULT_CONFIG_PATH, DatabaseName, FileSource, WriteOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load the configuration file
///
/// An explicitly given path must exist. Without one, the default path is used
/// if present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            debug!("Using config file {}", DEFAULT_CONFIG_PATH);
            Config::load(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

/// Output options from the config file with command-line overrides applied
fn output_options(
    config: &Config,
    directory: Option<PathBuf>,
    extension: Option<String>,
) -> WriteOptions {
    let mut options = config.output.clone();
    if let Some(directory) = directory {
        options.directory = directory;
    }
    if let Some(extension) = extension {
        options.extension = extension;
    }
    WriteOptions::resolved(Some(&options))
}

/// Rebuild all caches from the source directory and publish them
///
/// Caches filled before a source failure are still published; the failure is
/// reported afterwards.
pub fn cmd_update(
    config: &Config,
    source_dir: Option<PathBuf>,
    directory: Option<PathBuf>,
    extension: Option<String>,
) -> Result<()> {
    let root = source_dir
        .or_else(|| config.source.root.clone())
        .ok_or_else(|| anyhow!("No source directory: use --source-dir or set [source] root"))?;
    let options = output_options(config, directory, extension);

    info!(
        "Updating caches from {} into {}",
        root.display(),
        options.directory.display()
    );

    let mut caches = CacheMap::new(&config.options());
    let filled = caches.fill(&mut FileSource::new(&root));
    if let Err(e) = &filled {
        warn!("Population stopped early: {}", e);
    }

    let report = caches.write_files(Some(&options))?;
    for file in &report.published {
        println!(
            "{:<7} {} ({} bytes, mode {:04o})",
            file.database,
            file.path.display(),
            file.bytes,
            file.mode
        );
    }
    for database in &report.skipped {
        println!("{:<7} {} (unchanged)", database, options.path(*database).display());
    }

    filled?;
    Ok(())
}

/// Show the state of each published cache file
pub fn cmd_status(
    config: &Config,
    directory: Option<PathBuf>,
    extension: Option<String>,
) -> Result<()> {
    let options = output_options(config, directory, extension);

    for database in DatabaseName::ALL {
        let path = options.path(database);
        match fs::metadata(&path) {
            Ok(meta) => {
                let entries = match fs::read(&path) {
                    Ok(content) => content.iter().filter(|&&b| b == b'\n').count().to_string(),
                    Err(e) => {
                        debug!("Cannot read {}: {}", path.display(), e);
                        "?".to_string()
                    }
                };
                println!(
                    "{:<7} {} mode {:04o}, {} bytes, {} entries",
                    database,
                    path.display(),
                    file_mode(&meta),
                    meta.len(),
                    entries
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("{:<7} {} missing", database, path.display());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", path.display()));
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}
