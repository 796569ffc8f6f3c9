//! Per-read outcome types: set labels, read orientation and drop reasons.

use serde::Serialize;

/// Label reported when no barcode from a set is found
pub const NONE_LABEL: &str = "none";

/// Label reported when more than one barcode (or capture) fits
pub const AMBIGUOUS_LABEL: &str = "ambiguous";

/// Label reported when both flanks are present with nothing between them
pub const NO_INSERTION_LABEL: &str = "no_insertion";

/// Outcome of scanning one barcode set in one read
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Name of the matched barcode of a constant set
    Barcode(String),
    /// Captured span of a variable set (raw, translated, or parenthesized)
    Captured(String),
    None,
    NoInsertion,
    Ambiguous,
}

impl Label {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Barcode(name) => name,
            Self::Captured(seq) => seq,
            Self::None => NONE_LABEL,
            Self::NoInsertion => NO_INSERTION_LABEL,
            Self::Ambiguous => AMBIGUOUS_LABEL,
        }
    }

    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Barcode(s) | Self::Captured(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orientation of a read relative to the barcode specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Primer found in the read as given
    Forward,
    /// Primer found only after reverse-complementing
    ReverseComplement,
}

impl Orientation {
    #[must_use]
    pub fn is_flipped(self) -> bool {
        matches!(self, Self::ReverseComplement)
    }
}

/// Why a read was excluded from counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Primer absent in both orientations
    NoPrimer,
    /// Primer occurs more than once in the chosen orientation
    AmbiguousPrimer,
    /// Read contains bases that cannot be reverse-complemented
    Malformed,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPrimer => write!(f, "no_primer"),
            Self::AmbiguousPrimer => write!(f, "ambiguous_primer"),
            Self::Malformed => write!(f, "malformed"),
        }
    }
}
