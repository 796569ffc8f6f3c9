//! Matching pipeline: compile a specification once, then orient, scan and
//! count every read.
//!
//! - [`compiler`]: turns each barcode set into a [`CompiledMatcher`]
//! - [`patterns`]: choose-m-of-n wildcard expansion used for mismatch tolerance
//! - [`orientation`]: orients reads by the forward primer
//! - [`scanner`]: produces one label per set for an oriented read
//! - [`engine`]: the parallel per-run driver
//!
//! ## Example
//!
//! ```rust
//! use barcode_counter::core::spec::{BarcodeSet, BarcodeSpec, ConstantSet, VariableSet};
//! use barcode_counter::matching::engine::{CountingConfig, CountingEngine};
//! use barcode_counter::parsing::fastq::Read;
//!
//! let spec = BarcodeSpec::new(vec![
//!     BarcodeSet::constant("S1", ConstantSet::new(0, [("A", "AC"), ("B", "GT")])),
//!     BarcodeSet::variable("S2", VariableSet::new("TT", "GG")),
//! ])
//! .unwrap();
//!
//! let engine = CountingEngine::new(&spec, "CCCC", CountingConfig::default()).unwrap();
//! let reads = vec![
//!     Ok(Read::new("r1", b"ACTTAAGGCCCC".to_vec())),
//!     Ok(Read::new("r2", b"ACTTAAGGCCCC".to_vec())),
//! ];
//! let result = engine.run(reads).unwrap();
//!
//! assert_eq!(result.counts.get(&["A", "AA"]), Some(2));
//! ```
//!
//! [`CompiledMatcher`]: compiler::CompiledMatcher

pub mod compiler;
pub mod engine;
pub mod orientation;
pub mod patterns;
pub mod scanner;
