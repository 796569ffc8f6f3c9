//! Parsers for the run's two inputs.
//!
//! - **Barcode specification** ([`spec`]): YAML (or JSON) list of named sets
//! - **Reads** ([`fastq`]): FASTQ, optionally gzip compressed, or stdin
//!
//! ## Specification format
//!
//! ```yaml
//! - S1:
//!     type: constant
//!     start: 0
//!     mismatches: 1
//!     barcodes:
//!       A: ACGT
//!       B: TTGA
//! - S2:
//!     type: variable
//!     before: TTAG
//!     after: GGCA
//!     translate: true
//! ```
//!
//! | Field | Sets | Required |
//! |-------|------|----------|
//! | type | all | Yes |
//! | start | constant | Yes |
//! | barcodes | constant | Yes |
//! | before, after | variable | Yes |
//! | mismatches | all | No (0) |
//! | before_mismatches, after_mismatches | variable | No (`mismatches`) |
//! | translate | variable | No (false) |

pub mod fastq;
pub mod spec;
