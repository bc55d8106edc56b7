use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mtar")]
#[command(about = "Minimal tar-like archiver over file or memory streams")]
#[command(author, version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lists every entry in an archive
    List {
        /// Path to the archive
        archive: PathBuf,
    },

    /// Prints one entry's content to stdout
    Cat {
        /// Path to the archive
        archive: PathBuf,

        /// Name of the entry to print
        name: String,
    },

    /// Writes the two fixed smoke-test entries and finalizes the archive
    Sample {
        /// Path of the archive to create
        archive: PathBuf,
    },
}
