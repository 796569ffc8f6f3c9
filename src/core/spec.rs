//! Barcode specification model.
//!
//! A [`BarcodeSpec`] is an ordered list of uniquely named [`BarcodeSet`]s. Each set
//! is either a [`ConstantSet`] (an enumerated list of equal-length barcodes at a
//! fixed offset) or a [`VariableSet`] (whatever lies between two flanking
//! sequences). The order of sets defines the order of labels for each read and
//! the order of columns in the count table.

use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;

use crate::utils::validation::is_nucleotide_sequence;

/// A constant barcode set: candidate barcodes expected at a fixed read offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantSet {
    /// Offset of the first barcode base in the (oriented) read
    pub start: usize,

    /// `(name, sequence)` pairs in declaration order
    pub barcodes: Vec<(String, String)>,

    /// Maximum number of substitutions tolerated
    pub mismatches: usize,
}

impl ConstantSet {
    pub fn new<N, S>(start: usize, barcodes: impl IntoIterator<Item = (N, S)>) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            start,
            barcodes: barcodes
                .into_iter()
                .map(|(n, s)| (n.into(), s.into().to_ascii_uppercase()))
                .collect(),
            mismatches: 0,
        }
    }

    #[must_use]
    pub fn with_mismatches(mut self, mismatches: usize) -> Self {
        self.mismatches = mismatches;
        self
    }

    /// Length shared by every barcode in the set (0 for an empty set)
    pub fn barcode_length(&self) -> usize {
        self.barcodes.first().map_or(0, |(_, seq)| seq.len())
    }

    /// Read window `[start, start + barcode_length)` scanned for this set
    pub fn window(&self) -> Range<usize> {
        self.start..self.start.saturating_add(self.barcode_length())
    }

    fn validate(&self, name: &str, errors: &mut Vec<String>) {
        if self.barcodes.is_empty() {
            errors.push(format!("Constant set '{name}' must contain at least one barcode"));
            return;
        }

        for (barcode, seq) in &self.barcodes {
            if !is_nucleotide_sequence(seq) {
                errors.push(format!(
                    "Barcode '{barcode}' in set '{name}' must contain only A, C, G or T (got '{seq}')"
                ));
            }
        }

        let length = self.barcode_length();
        if self.barcodes.iter().any(|(_, seq)| seq.len() != length) {
            errors.push(format!(
                "All barcodes in constant set '{name}' must be the same length"
            ));
        } else if self.mismatches > length {
            errors.push(format!(
                "Number of mismatches ({}) must not be greater than the length of barcodes ({length}) in set '{name}'",
                self.mismatches
            ));
        }

        if self.start.checked_add(length).is_none() {
            errors.push(format!(
                "Start position ({}) of set '{name}' is too large for barcodes of length {length}",
                self.start
            ));
        }
    }
}

/// A variable barcode set: the span between two flanking sequences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSet {
    pub before: String,
    pub after: String,

    /// Substitutions tolerated in `before`
    pub before_mismatches: usize,

    /// Substitutions tolerated in `after`
    pub after_mismatches: usize,

    /// Translate captures whose length is a multiple of 3 into amino acids
    pub translate: bool,
}

impl VariableSet {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into().to_ascii_uppercase(),
            after: after.into().to_ascii_uppercase(),
            before_mismatches: 0,
            after_mismatches: 0,
            translate: false,
        }
    }

    /// Set the same mismatch tolerance on both flanks
    #[must_use]
    pub fn with_mismatches(mut self, mismatches: usize) -> Self {
        self.before_mismatches = mismatches;
        self.after_mismatches = mismatches;
        self
    }

    #[must_use]
    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    fn validate(&self, name: &str, errors: &mut Vec<String>) {
        for (flank, seq, mismatches) in [
            ("before", &self.before, self.before_mismatches),
            ("after", &self.after, self.after_mismatches),
        ] {
            if !is_nucleotide_sequence(seq) {
                errors.push(format!(
                    "Sequence '{flank}' in set '{name}' must be non-empty and contain only A, C, G or T (got '{seq}')"
                ));
            } else if mismatches > seq.len() {
                errors.push(format!(
                    "Number of mismatches ({mismatches}) must not be greater than the length of '{flank}' ({}) in set '{name}'",
                    seq.len()
                ));
            }
        }
    }
}

/// Shape of one barcode set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetSpec {
    Constant(ConstantSet),
    Variable(VariableSet),
}

/// A named barcode set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeSet {
    pub name: String,
    #[serde(flatten)]
    pub spec: SetSpec,
}

impl BarcodeSet {
    pub fn constant(name: impl Into<String>, set: ConstantSet) -> Self {
        Self {
            name: name.into(),
            spec: SetSpec::Constant(set),
        }
    }

    pub fn variable(name: impl Into<String>, set: VariableSet) -> Self {
        Self {
            name: name.into(),
            spec: SetSpec::Variable(set),
        }
    }

    /// Collect every content violation of this set.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match &self.spec {
            SetSpec::Constant(set) => set.validate(&self.name, &mut errors),
            SetSpec::Variable(set) => set.validate(&self.name, &mut errors),
        }
        errors
    }

    /// One-line human-readable description
    pub fn describe(&self) -> String {
        match &self.spec {
            SetSpec::Constant(set) => format!(
                "set {} contains {} barcodes of length {}, starts at position {} in read, and allows {} mismatches",
                self.name,
                set.barcodes.len(),
                set.barcode_length(),
                set.start,
                set.mismatches
            ),
            SetSpec::Variable(set) => format!(
                "set {} consists of all sequences between {} and {} in the read; captures {} translated into amino acids",
                self.name,
                set.before,
                set.after,
                if set.translate { "will be" } else { "will not be" }
            ),
        }
    }
}

/// Validated, ordered list of barcode sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeSpec {
    sets: Vec<BarcodeSet>,
}

impl BarcodeSpec {
    /// Build a specification, checking every set and name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns every violation found as a human-readable message; no partially
    /// valid specification is ever returned.
    pub fn new(sets: Vec<BarcodeSet>) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        if sets.is_empty() {
            errors.push("Specification must contain at least one barcode set".to_string());
        }

        let mut seen = HashSet::new();
        for set in &sets {
            if !seen.insert(set.name.as_str()) {
                errors.push(format!(
                    "Duplicate set name '{}': please specify unique names for each barcode set",
                    set.name
                ));
            }
            errors.extend(set.validate());
        }

        if errors.is_empty() {
            Ok(Self { sets })
        } else {
            Err(errors)
        }
    }

    pub fn sets(&self) -> &[BarcodeSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set names in specification order (the count table's label columns)
    pub fn names(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.name.clone()).collect()
    }
}
