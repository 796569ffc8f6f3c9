//! Command-line interface for barcode-counter.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **count**: Count barcode combinations in a FASTQ file
//! - **validate**: Check a barcode specification and describe its sets
//!
//! ## Usage
//!
//! ```text
//! # Count combinations, writing counts.tsv
//! barcode-counter count -i reads.fastq.gz -b barcodes.yml -p GATTACA
//!
//! # Read from stdin, JSON run summary
//! zcat reads.fastq.gz | barcode-counter count -i - -b barcodes.yml -p GATTACA --format json
//!
//! # Check a specification
//! barcode-counter validate -b barcodes.yml
//! ```

use clap::{Parser, Subcommand};

pub mod count;
pub mod validate;

#[derive(Parser)]
#[command(name = "barcode-counter")]
#[command(version)]
#[command(about = "Count combinations of barcodes in sequencing reads")]
#[command(
    long_about = "barcode-counter orients each read using a forward primer, finds one barcode per set in it and counts how often every combination of barcodes occurs.\n\nBarcode sets are either:\n- constant: a list of equal-length barcodes at a fixed position, optionally allowing mismatches\n- variable: whatever lies between two flanking sequences, optionally translated into amino acids"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for summaries
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count barcode combinations in a FASTQ file
    Count(count::CountArgs),

    /// Validate a barcode specification
    Validate(validate::ValidateArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
