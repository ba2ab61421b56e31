// src/cli.rs
//! CLI definitions for nsscache
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nsscache")]
#[command(version)]
#[command(about = "Build and atomically publish libnss-cache files", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: /etc/nsscache.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the passwd, shadow and group caches and publish them
    Update {
        /// Directory containing passwd, shadow and group source files
        #[arg(short, long)]
        source_dir: Option<PathBuf>,

        /// Output directory for the cache files
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// File extension of the cache files
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Show the published cache files
    Status {
        /// Output directory for the cache files
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// File extension of the cache files
        #[arg(short, long)]
        extension: Option<String>,
    },
}
