//! packfs Shell Binary
//!
//! Opens (or creates) an archive and drops into the interactive shell.

use std::io::{self, BufReader};

use clap::Parser;
use packfs::{Archive, Config, Shell};
use tracing_subscriber::{fmt, EnvFilter};

/// packfs interactive shell
#[derive(Parser, Debug)]
#[command(name = "packfs")]
#[command(about = "Single-file hierarchical archive with compact-on-sync storage")]
#[command(version)]
struct Args {
    /// Path of the archive file
    archive: String,

    /// Fail instead of creating the archive when it does not exist
    #[arg(long)]
    no_create: bool,

    /// Chunk size for bulk copies, in KB
    #[arg(long, default_value = "64")]
    copy_buffer_kb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,packfs=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("packfs v{}", packfs::VERSION);

    let config = Config::builder()
        .create_if_missing(!args.no_create)
        .copy_buffer_size(args.copy_buffer_kb * 1024)
        .build();

    let archive = match Archive::open_with(&args.archive, config) {
        Ok(archive) => archive,
        Err(err) => {
            tracing::error!("failed to open {}: {}", args.archive, err);
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(archive);
    let stdin = BufReader::new(io::stdin());
    if let Err(err) = shell.run(stdin, io::stdout()) {
        tracing::error!("shell error: {}", err);
        std::process::exit(1);
    }

    let archive = shell.into_archive();
    if archive.is_dirty() {
        tracing::warn!("archive has unsynced edits that were not committed");
    }
}
