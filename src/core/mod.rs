//! Core data types for barcode counting.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`spec`]: The barcode specification ([`BarcodeSpec`], [`ConstantSet`], [`VariableSet`])
//! - [`sequence`]: Nucleotide helpers (reverse complement, primer search, translation)
//! - [`types`]: Per-read outcomes ([`Label`], [`Orientation`], [`DropReason`])
//! - [`counts`]: The hierarchical [`CountTree`] of label combinations
//!
//! ## Labels
//!
//! Every barcode set yields exactly one label per scanned read:
//!
//! | Label | Meaning |
//! |-------|---------|
//! | barcode name | constant set matched one barcode |
//! | captured sequence | variable set found one span between its flanks |
//! | `none` | nothing found |
//! | `no_insertion` | both flanks found with nothing between them |
//! | `ambiguous` | more than one barcode or span fits |
//!
//! [`BarcodeSpec`]: spec::BarcodeSpec
//! [`ConstantSet`]: spec::ConstantSet
//! [`VariableSet`]: spec::VariableSet
//! [`Label`]: types::Label
//! [`Orientation`]: types::Orientation
//! [`DropReason`]: types::DropReason
//! [`CountTree`]: counts::CountTree

pub mod counts;
pub mod sequence;
pub mod spec;
pub mod types;
