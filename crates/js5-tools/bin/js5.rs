//! `js5` binary entry point.
//!
//! Thin wrapper around the js5-tools library: parses arguments, sets up
//! logging, runs one tool and prints its result.

use anyhow::{Context, Result};
use clap::Parser;
use js5_store::{Cache, FileStore};
use js5_tools::cli::{Cli, Command};
use serde::Serialize;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Using cache at {}", cli.root.display());

    match cli.command {
        Command::Verify => {
            let store = open_store(&cli)?;
            let report = js5_tools::verify(&store)?;
            if cli.json {
                print_json(&report)?;
            } else {
                for finding in &report.findings {
                    println!("{finding}");
                }
                println!(
                    "{} files in {} tables, {} problems",
                    report.files,
                    report.tables,
                    report.findings.len()
                );
            }
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Defrag { ref output } => {
            let store = open_store(&cli)?;
            let stats = js5_tools::defragment(&store, output)
                .with_context(|| format!("defragmenting into {}", output.display()))?;
            if cli.json {
                print_json(&stats)?;
            } else {
                println!(
                    "Copied {} tables and {} files ({} bytes) to {}",
                    stats.tables,
                    stats.files,
                    stats.bytes,
                    output.display()
                );
            }
        }
        Command::Aggregate { ref other } => {
            let mut store = open_store(&cli)?;
            let other_store = FileStore::open(other)
                .with_context(|| format!("opening other cache at {}", other.display()))?;
            let stats = js5_tools::aggregate(&mut store, &other_store)?;
            store.close()?;
            if cli.json {
                print_json(&stats)?;
            } else {
                println!(
                    "{} files checked, {} damaged, {} repaired",
                    stats.checked, stats.damaged, stats.repaired
                );
            }
        }
        Command::Checksum {
            whirlpool,
            ref output,
        } => {
            let cache = Cache::new(open_store(&cli)?);
            let table = cache.create_checksum_table()?;
            if let Some(path) = output {
                std::fs::write(path, table.encode(whirlpool)?)
                    .with_context(|| format!("writing {}", path.display()))?;
            } else if cli.json {
                print_json(&table.entries.iter().map(ChecksumRow::from).collect::<Vec<_>>())?;
            } else {
                for (type_id, entry) in table.entries.iter().enumerate() {
                    println!(
                        "{type_id:3} crc {:08x} version {:10} {}",
                        entry.crc, entry.version, entry.digest
                    );
                }
            }
        }
        Command::Dump { type_id } => {
            let cache = Cache::new(open_store(&cli)?);
            let entries = js5_tools::dump(&cache, type_id)?;
            if cli.json {
                print_json(&entries)?;
            } else {
                for entry in &entries {
                    println!(
                        "{:6} crc {:08x} version {:6} members {}",
                        entry.id,
                        entry.crc,
                        entry.version,
                        entry.members.len()
                    );
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_store(cli: &Cli) -> Result<FileStore> {
    FileStore::open(&cli.root).with_context(|| format!("opening cache at {}", cli.root.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ChecksumRow {
    crc: u32,
    version: u32,
    digest: String,
}

impl From<&js5_store::ChecksumEntry> for ChecksumRow {
    fn from(entry: &js5_store::ChecksumEntry) -> Self {
        Self {
            crc: entry.crc,
            version: entry.version,
            digest: entry.digest.to_hex(),
        }
    }
}
