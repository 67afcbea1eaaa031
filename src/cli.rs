use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turn photographed text into calendar events.
#[derive(Parser)]
#[command(name = "snapcal", version, about)]
pub struct Cli {
    /// Directory exported calendar files are written to (overrides SNAPCAL_OUTPUT_DIR).
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the snapshot source until interrupted, then export every event found.
    Scan {
        /// Image file or directory to sample (overrides SNAPCAL_SOURCE).
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Recognize events in a single photograph and export them.
    Image {
        /// Path of the photograph.
        path: PathBuf,
    },

    /// Parse a text fragment and print the resulting calendar record.
    Parse {
        /// Text containing a date or time.
        text: String,

        /// Reference instant in RFC 3339 form (defaults to now).
        #[arg(long)]
        at: Option<String>,
    },
}
