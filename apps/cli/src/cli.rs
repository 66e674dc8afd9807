use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docupload",
    version,
    about = "Upload PDF documents to the ingestion backend",
    after_help = "\
Configuration file lookup order:
  1. --config <path>                               (explicit flag)
  2. $XDG_CONFIG_HOME/docupload/config.toml
  3. ~/.config/docupload/config.toml

Environment variables:
  RUST_LOG   Log filter (overrides -v)"
)]
pub(crate) struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the document routes (overrides config)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Chunk size in bytes (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,

    /// Largest file sent in a single request, in bytes (overrides config)
    #[arg(long)]
    pub direct_limit: Option<u64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Upload a document
    Upload {
        /// File to upload
        file: PathBuf,

        /// Document title sent to the server (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Emit progress and the result as JSON lines on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show how a file would be uploaded, without contacting the server
    Plan {
        /// File to inspect
        file: PathBuf,
    },
}
