// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: output directory
fn directory_arg() -> Arg {
    Arg::new("directory")
        .short('d')
        .long("directory")
        .value_name("DIR")
        .help("Output directory for the cache files (default: /etc)")
}

/// Common argument: cache file extension
fn extension_arg() -> Arg {
    Arg::new("extension")
        .short('e')
        .long("extension")
        .value_name("EXT")
        .help("File extension of the cache files (default: cache)")
}

fn build_cli() -> Command {
    Command::new("nsscache")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build and atomically publish libnss-cache files")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Path to the configuration file (default: /etc/nsscache.toml if present)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("update")
                .about("Rebuild the passwd, shadow and group caches and publish them")
                .arg(
                    Arg::new("source_dir")
                        .short('s')
                        .long("source-dir")
                        .value_name("DIR")
                        .help("Directory containing passwd, shadow and group source files"),
                )
                .arg(directory_arg())
                .arg(extension_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Show the published cache files")
                .arg(directory_arg())
                .arg(extension_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("nsscache.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
