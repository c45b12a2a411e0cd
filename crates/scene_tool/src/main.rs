//! # scene-tool
//!
//! Inspect and convert scene documents.
//!
//! Every command loads the document into a live [`Scene`](scene::Scene), so
//! component types the tool has never heard of are registered as
//! placeholders and come back out unchanged.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scene-tool", about = "Inspect and convert scene documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print entities, components and attribute values
    Inspect {
        /// Scene document (.json, .msgpack, .mpk or .bin)
        file: PathBuf,
    },
    /// Re-encode a document, choosing formats by file extension
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Keep temporary entities and components
        #[arg(long)]
        include_temporary: bool,
    },
    /// Print each component's binary encoding in hex
    Wire {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let output = match args.command {
        Command::Inspect { file } => commands::inspect(&file)?,
        Command::Convert {
            input,
            output,
            include_temporary,
        } => commands::convert(&input, &output, include_temporary)?,
        Command::Wire { file } => commands::wire(&file)?,
    };
    print!("{output}");
    Ok(())
}
