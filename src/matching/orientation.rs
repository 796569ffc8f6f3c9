//! Orientation of reads relative to the forward primer.
//!
//! A read is used as given if the primer occurs in it, otherwise its reverse
//! complement is tried. Reads without the primer in either orientation, or
//! with more than one occurrence in the chosen orientation, are dropped since
//! the fixed offsets of constant sets would be unreliable.

use std::borrow::Cow;

use crate::core::sequence::{
    count_occurrences, reverse_complement, validate_nucleotides, SequenceError,
};
use crate::core::types::{DropReason, Orientation};

/// A read in the orientation the barcode sets are defined in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientedRead<'a> {
    pub sequence: Cow<'a, [u8]>,
    pub orientation: Orientation,
}

/// Result of orienting one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Oriented(OrientedRead<'a>),
    Dropped(DropReason),
}

/// Orients reads using an exact, case-insensitive forward primer
#[derive(Debug, Clone)]
pub struct OrientationResolver {
    primer: Vec<u8>,
}

impl OrientationResolver {
    /// # Errors
    ///
    /// Returns `SequenceError::Empty` for an empty primer, or
    /// `SequenceError::InvalidBase` if it is not a nucleotide sequence.
    pub fn new(primer: &str) -> Result<Self, SequenceError> {
        if primer.is_empty() {
            return Err(SequenceError::Empty);
        }
        validate_nucleotides(primer.as_bytes())?;
        Ok(Self {
            primer: primer.as_bytes().to_ascii_uppercase(),
        })
    }

    pub fn primer(&self) -> &[u8] {
        &self.primer
    }

    /// Orient `read`, reverse-complementing it if the primer is only found that way
    pub fn resolve<'a>(&self, read: &'a [u8]) -> Resolution<'a> {
        let forward = count_occurrences(read, &self.primer);
        let (sequence, orientation, occurrences) = if forward > 0 {
            (Cow::Borrowed(read), Orientation::Forward, forward)
        } else {
            let Ok(flipped) = reverse_complement(read) else {
                return Resolution::Dropped(DropReason::Malformed);
            };
            let occurrences = count_occurrences(&flipped, &self.primer);
            (
                Cow::Owned(flipped),
                Orientation::ReverseComplement,
                occurrences,
            )
        };

        match occurrences {
            0 => Resolution::Dropped(DropReason::NoPrimer),
            1 => Resolution::Oriented(OrientedRead {
                sequence,
                orientation,
            }),
            _ => Resolution::Dropped(DropReason::AmbiguousPrimer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> OrientationResolver {
        OrientationResolver::new("gattaca").unwrap()
    }

    #[test]
    fn test_forward_read_not_flipped() {
        let read = b"ACGTGATTACAACGT";
        match resolver().resolve(read) {
            Resolution::Oriented(o) => {
                assert_eq!(o.orientation, Orientation::Forward);
                assert_eq!(&*o.sequence, read.as_slice());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reverse_read_flipped() {
        let forward = b"ACGTGATTACAACCC";
        let reverse = reverse_complement(forward).unwrap();
        match resolver().resolve(&reverse) {
            Resolution::Oriented(o) => {
                assert!(o.orientation.is_flipped());
                assert_eq!(&*o.sequence, forward.as_slice());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_primer_case_insensitive() {
        assert!(matches!(
            resolver().resolve(b"ttgattacatt"),
            Resolution::Oriented(_)
        ));
    }

    #[test]
    fn test_missing_primer_dropped() {
        assert_eq!(
            resolver().resolve(b"ACGTACGTACGT"),
            Resolution::Dropped(DropReason::NoPrimer)
        );
    }

    #[test]
    fn test_repeated_primer_dropped() {
        assert_eq!(
            resolver().resolve(b"GATTACAxxGATTACA"),
            Resolution::Dropped(DropReason::AmbiguousPrimer)
        );
    }

    #[test]
    fn test_unflippable_read_dropped() {
        assert_eq!(
            resolver().resolve(b"ACGTNNNN"),
            Resolution::Dropped(DropReason::Malformed)
        );
    }

    #[test]
    fn test_invalid_primer() {
        assert!(OrientationResolver::new("GATN").is_err());
        assert!(OrientationResolver::new("").is_err());
    }
}
