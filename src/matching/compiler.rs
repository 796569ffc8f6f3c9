//! Compile a [`BarcodeSpec`] into per-set matchers.
//!
//! Each set becomes exactly one [`CompiledMatcher`]:
//!
//! | Set | Mismatches | Matcher |
//! |-----|------------|---------|
//! | constant | 0 | [`CompiledMatcher::ExactLookup`] |
//! | constant | > 0 | [`CompiledMatcher::FuzzyLookup`] |
//! | variable | any | [`CompiledMatcher::FlankCapture`] |
//!
//! Compilation happens once per run; the result is immutable and shared by all
//! scanning threads.

use regex::bytes::Regex;
use thiserror::Error;
use tracing::debug;

use crate::core::sequence::{validate_nucleotides, SequenceError};
use crate::core::spec::{BarcodeSpec, ConstantSet, SetSpec, VariableSet};
use crate::matching::patterns::{expand_mismatches, WildcardPattern};
use crate::utils::validation::{
    binomial, check_pattern_limit, MAX_FLANK_PAIRS, MAX_PATTERNS_PER_SET,
};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Set '{set}': {source}")]
    Sequence {
        set: String,
        #[source]
        source: SequenceError,
    },

    #[error("Set '{set}': failed to build flank regex: {source}")]
    Regex {
        set: String,
        #[source]
        source: regex::Error,
    },

    #[error("{0}")]
    TooManyPatterns(String),
}

/// Regexes locating the flanks of a variable set
#[derive(Debug, Clone)]
pub struct FlankCapture {
    /// Every expanded `before` pattern on its own
    pub before: Vec<Regex>,
    /// Every expanded `after` pattern on its own
    pub after: Vec<Regex>,
    /// `before(.*)after` for every pair of expanded patterns
    pub captures: Vec<Regex>,
    pub translate: bool,
}

/// Pre-compiled matching strategy for one barcode set
#[derive(Debug, Clone)]
pub enum CompiledMatcher {
    /// Zero mismatches: compare the window to each barcode
    ExactLookup {
        start: usize,
        stop: usize,
        barcodes: Vec<(String, Vec<u8>)>,
    },
    /// Mismatches allowed: test the window against each barcode's wildcard patterns
    FuzzyLookup {
        start: usize,
        stop: usize,
        barcodes: Vec<(String, Vec<WildcardPattern>)>,
    },
    /// Capture whatever lies between the flanks anywhere in the read
    FlankCapture(FlankCapture),
}

impl CompiledMatcher {
    /// Total number of patterns (barcodes, wildcard patterns or regex pairs)
    pub fn pattern_count(&self) -> usize {
        match self {
            Self::ExactLookup { barcodes, .. } => barcodes.len(),
            Self::FuzzyLookup { barcodes, .. } => barcodes.iter().map(|(_, p)| p.len()).sum(),
            Self::FlankCapture(capture) => capture.captures.len(),
        }
    }
}

/// A compiled matcher with the name of the set it was built from
#[derive(Debug, Clone)]
pub struct CompiledSet {
    pub name: String,
    pub matcher: CompiledMatcher,
}

/// Ordered list of compiled matchers, one per barcode set
#[derive(Debug, Clone)]
pub struct MatcherSet {
    sets: Vec<CompiledSet>,
}

impl MatcherSet {
    /// Compile every set of `spec`, in order
    ///
    /// # Errors
    ///
    /// Returns `CompileError::Sequence` for non-nucleotide barcodes or flanks,
    /// `CompileError::TooManyPatterns` if a set's expansion exceeds the limits,
    /// or `CompileError::Regex` if a flank regex cannot be built.
    pub fn compile(spec: &BarcodeSpec) -> Result<Self, CompileError> {
        let mut sets = Vec::with_capacity(spec.len());
        for set in spec.sets() {
            let matcher = match &set.spec {
                SetSpec::Constant(constant) => compile_constant(&set.name, constant)?,
                SetSpec::Variable(variable) => compile_variable(&set.name, variable)?,
            };
            debug!(
                "Compiled set {} into {} pattern(s)",
                set.name,
                matcher.pattern_count()
            );
            sets.push(CompiledSet {
                name: set.name.clone(),
                matcher,
            });
        }
        Ok(Self { sets })
    }

    pub fn sets(&self) -> &[CompiledSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.name.clone()).collect()
    }
}

fn checked_sequence(set: &str, seq: &str) -> Result<Vec<u8>, CompileError> {
    validate_nucleotides(seq.as_bytes()).map_err(|source| CompileError::Sequence {
        set: set.to_string(),
        source,
    })?;
    Ok(seq.as_bytes().to_ascii_uppercase())
}

fn compile_constant(name: &str, set: &ConstantSet) -> Result<CompiledMatcher, CompileError> {
    let window = set.window();
    let barcodes = set
        .barcodes
        .iter()
        .map(|(barcode, seq)| Ok((barcode.clone(), checked_sequence(name, seq)?)))
        .collect::<Result<Vec<_>, CompileError>>()?;

    if set.mismatches == 0 {
        return Ok(CompiledMatcher::ExactLookup {
            start: window.start,
            stop: window.end,
            barcodes,
        });
    }

    let total = binomial(set.barcode_length(), set.mismatches)
        .and_then(|per_barcode| per_barcode.checked_mul(barcodes.len()));
    if let Some(message) = check_pattern_limit(name, total, MAX_PATTERNS_PER_SET) {
        return Err(CompileError::TooManyPatterns(message));
    }

    Ok(CompiledMatcher::FuzzyLookup {
        start: window.start,
        stop: window.end,
        barcodes: barcodes
            .into_iter()
            .map(|(barcode, seq)| (barcode, expand_mismatches(&seq, set.mismatches)))
            .collect(),
    })
}

fn compile_variable(name: &str, set: &VariableSet) -> Result<CompiledMatcher, CompileError> {
    let before = checked_sequence(name, &set.before)?;
    let after = checked_sequence(name, &set.after)?;

    let pairs = binomial(before.len(), set.before_mismatches)
        .zip(binomial(after.len(), set.after_mismatches))
        .and_then(|(b, a)| b.checked_mul(a));
    if let Some(message) = check_pattern_limit(name, pairs, MAX_FLANK_PAIRS) {
        return Err(CompileError::TooManyPatterns(message));
    }

    let before_patterns: Vec<String> = expand_mismatches(&before, set.before_mismatches)
        .iter()
        .map(WildcardPattern::to_regex)
        .collect();
    let after_patterns: Vec<String> = expand_mismatches(&after, set.after_mismatches)
        .iter()
        .map(WildcardPattern::to_regex)
        .collect();

    let build = |pattern: &str| {
        Regex::new(&format!("(?i){pattern}")).map_err(|source| CompileError::Regex {
            set: name.to_string(),
            source,
        })
    };

    let mut captures = Vec::with_capacity(before_patterns.len() * after_patterns.len());
    for b in &before_patterns {
        for a in &after_patterns {
            captures.push(build(&format!("{b}(.*){a}"))?);
        }
    }

    Ok(CompiledMatcher::FlankCapture(FlankCapture {
        before: before_patterns
            .iter()
            .map(|p| build(p))
            .collect::<Result<_, _>>()?,
        after: after_patterns
            .iter()
            .map(|p| build(p))
            .collect::<Result<_, _>>()?,
        captures,
        translate: set.translate,
    }))
}
