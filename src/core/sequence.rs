//! Nucleotide sequence helpers: alphabet checks, reverse complement, primer
//! occurrence counting and codon translation.

use thiserror::Error;

use crate::utils::validation::first_invalid_base;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Invalid base '{base}' at position {position} in sequence '{sequence}'")]
    InvalidBase {
        sequence: String,
        base: char,
        position: usize,
    },

    #[error("Sequence must not be empty")]
    Empty,
}

/// Check that every base of `seq` is one of `{A, C, G, T}` (either case).
///
/// # Errors
///
/// Returns `SequenceError::InvalidBase` naming the first offending base.
pub fn validate_nucleotides(seq: &[u8]) -> Result<(), SequenceError> {
    match first_invalid_base(seq) {
        None => Ok(()),
        Some((position, base)) => Err(SequenceError::InvalidBase {
            sequence: String::from_utf8_lossy(seq).into_owned(),
            base: char::from(base),
            position,
        }),
    }
}

/// Reverse-complement a nucleotide sequence, preserving case.
///
/// # Errors
///
/// Returns `SequenceError::InvalidBase` if the sequence contains anything
/// outside `{A, C, G, T, a, c, g, t}`.
///
/// # Examples
///
/// ```
/// use barcode_counter::core::sequence::reverse_complement;
///
/// assert_eq!(reverse_complement(b"AACg").unwrap(), b"cGTT".to_vec());
/// assert!(reverse_complement(b"ACNT").is_err());
/// ```
pub fn reverse_complement(seq: &[u8]) -> Result<Vec<u8>, SequenceError> {
    validate_nucleotides(seq)?;
    Ok(seq
        .iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            b'a' => b't',
            b't' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            other => *other,
        })
        .collect())
}

/// Count non-overlapping, case-insensitive occurrences of `needle` in `haystack`.
///
/// Scanning resumes after the end of each hit, so `AAAA` contains `AA` twice.
#[must_use]
pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || needle.len() > haystack.len() {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Standard genetic code, indexed by `16 * b1 + 4 * b2 + b3` with `T=0, C=1, A=2, G=3`.
const CODON_TABLE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn codon_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Translate a coding sequence to one-letter amino acids using the standard
/// genetic code. Stop codons become `*`, codons with unknown bases become `X`,
/// and a trailing partial codon is ignored.
///
/// # Examples
///
/// ```
/// use barcode_counter::core::sequence::translate;
///
/// assert_eq!(translate(b"ATGGCCTAA"), "MA*");
/// ```
#[must_use]
pub fn translate(seq: &[u8]) -> String {
    seq.chunks_exact(3)
        .map(|codon| {
            match (
                codon_index(codon[0]),
                codon_index(codon[1]),
                codon_index(codon[2]),
            ) {
                (Some(a), Some(b), Some(c)) => char::from(CODON_TABLE[16 * a + 4 * b + c]),
                _ => 'X',
            }
        })
        .collect()
}
