use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(about = "Split PDFs by page range, per page, custom ranges, or a new page order")]
#[command(version)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display page count and PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Split a PDF into one or more new PDFs
    Split {
        #[command(subcommand)]
        mode: SplitCommand,
    },
}

#[derive(Args)]
pub struct SplitTarget {
    /// PDF file to split
    pub path: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum SplitCommand {
    /// Extract one contiguous page range
    Range {
        #[command(flatten)]
        target: SplitTarget,

        /// First page (1-based, inclusive)
        #[arg(short, long, default_value = "1")]
        start: u32,

        /// Last page (1-based, inclusive; defaults to the last page)
        #[arg(short, long)]
        end: Option<u32>,
    },

    /// Write every page to its own file
    #[command(alias = "burst")]
    Pages {
        #[command(flatten)]
        target: SplitTarget,
    },

    /// Write one file per range expression
    Custom {
        #[command(flatten)]
        target: SplitTarget,

        /// Range expression, repeatable (e.g., "1-5, 8, 10-12")
        #[arg(short, long = "range", required = true)]
        ranges: Vec<String>,

        /// Drop the range at this position (0-based) before splitting, repeatable
        #[arg(long = "skip", value_name = "INDEX")]
        skip: Vec<usize>,
    },

    /// Write all pages in a new order
    Reorder {
        #[command(flatten)]
        target: SplitTarget,

        /// Full page order (e.g., "3,1,2")
        #[arg(long)]
        order: Option<String>,

        /// Move the page at position FROM to position TO (0-based), repeatable
        #[arg(short, long = "move", value_name = "FROM:TO")]
        moves: Vec<String>,
    },
}
