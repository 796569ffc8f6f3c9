//! Tab-separated output tables.
//!
//! - [`tsv::write_counts`]: one row per observed label combination with its count
//! - [`tsv::write_read_outcomes`]: per-read debug table
//!
//! File variants write to a `.partial` sibling and rename on success, so an
//! aborted run never leaves a truncated table at the destination.

pub mod tsv;

pub use tsv::{write_counts, write_counts_file, write_read_outcomes, write_read_outcomes_file};
