//! CLI definitions for SnapQueue.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SnapQueue CLI.
#[derive(Parser)]
#[command(name = "snapqueue")]
#[command(about = "Persistent photo upload queue")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Upload queued photos and watch the inbox until Ctrl-C (default).
    /// Requires `uploader.public_key` (e.g. from `UPLOADCARE_PUBLIC_KEY`)
    Run {
        /// Inbox directory, overrides `inbox.path`
        #[arg(long)]
        inbox: Option<PathBuf>,
    },

    /// Add photos to the queue without uploading them
    Enqueue {
        /// Photo files, queued in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the number of photos waiting to be uploaded
    Status,
}
