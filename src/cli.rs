use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rangepdf")]
#[command(about = "Split a PDF by page ranges and merge the parts back, with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pause between extraction steps, in milliseconds
    #[arg(long, global = true, default_value = "0")]
    pub step_delay_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display page count and metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Split a PDF into one file per page range
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Page range, START[-END][:NAME] (e.g. "1-5:intro", "6-end"); repeatable
        #[arg(short, long = "range")]
        ranges: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Also merge the parts into {name}_unido.pdf
        #[arg(short, long)]
        merge: bool,

        /// Order of the parts before merging, as 1-based positions (e.g. "2,1,3")
        #[arg(long, value_delimiter = ',')]
        order: Vec<usize>,
    },

    /// Combine PDFs into one, in the given order
    Merge {
        /// PDF files or directories of PDFs to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}
