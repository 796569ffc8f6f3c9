//! # barcode-counter
//!
//! A library for counting combinations of barcodes in sequencing reads.
//!
//! Amplicon libraries are often built from several independently varied
//! regions: a sample index at a fixed offset, a library member between two
//! constant flanks, and so on. `barcode-counter` finds one barcode per region
//! in every read and counts how often each combination occurs.
//!
//! ## Features
//!
//! - **Constant sets**: enumerated barcodes at a fixed position, with optional
//!   mismatch tolerance
//! - **Variable sets**: whatever lies between two flanking sequences, optionally
//!   translated into amino acids
//! - **Orientation**: reads are reverse-complemented when the forward primer is
//!   only found that way
//! - **Parallel counting**: batches of reads are scanned on a rayon pool with
//!   deterministic output order
//!
//! ## Example
//!
//! ```rust,no_run
//! use barcode_counter::{CountingConfig, CountingEngine, ReadSource};
//! use barcode_counter::parsing::spec::parse_spec_file;
//! use std::path::Path;
//!
//! let spec = parse_spec_file(Path::new("barcodes.yml")).unwrap();
//! let engine = CountingEngine::new(&spec, "GATTACA", CountingConfig::default()).unwrap();
//!
//! let reads = ReadSource::open(Path::new("reads.fastq.gz")).unwrap();
//! let result = engine.run(reads).unwrap();
//!
//! for (labels, count) in result.counts.rows() {
//!     println!("{}\t{count}", labels.join("\t"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Specification model, labels, sequence helpers and the count tree
//! - [`parsing`]: Specification and FASTQ parsers
//! - [`matching`]: Matcher compilation, orientation, scanning and the counting engine
//! - [`report`]: Tab-separated output tables
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod report;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::counts::CountTree;
pub use crate::core::spec::{BarcodeSet, BarcodeSpec, ConstantSet, SetSpec, VariableSet};
pub use crate::core::types::*;
pub use matching::engine::{CountingConfig, CountingEngine, RunResult, RunStats};
pub use parsing::fastq::{Read, ReadSource};
