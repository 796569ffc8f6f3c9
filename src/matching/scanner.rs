//! Per-read barcode scanning.
//!
//! Every compiled set produces exactly one [`Label`] for a read, in set order.
//! Scanning is a pure function of the oriented read and the immutable
//! [`MatcherSet`], so it is safe to call from any number of threads.

use thiserror::Error;

use crate::core::sequence::translate;
use crate::core::types::Label;
use crate::matching::compiler::{CompiledMatcher, FlankCapture, MatcherSet};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Produced {found} label(s) for {expected} barcode set(s)")]
    LabelCount { expected: usize, found: usize },
}

/// Scan `read` against every set of `matchers`, returning one label per set.
///
/// # Errors
///
/// Returns `ScanError::LabelCount` if the number of labels does not equal the
/// number of sets.
pub fn scan_read(matchers: &MatcherSet, read: &[u8]) -> Result<Vec<Label>, ScanError> {
    let labels: Vec<Label> = matchers
        .sets()
        .iter()
        .map(|set| scan_set(&set.matcher, read))
        .collect();

    if labels.len() != matchers.len() {
        return Err(ScanError::LabelCount {
            expected: matchers.len(),
            found: labels.len(),
        });
    }
    Ok(labels)
}

/// Scan a single set
pub fn scan_set(matcher: &CompiledMatcher, read: &[u8]) -> Label {
    match matcher {
        CompiledMatcher::ExactLookup {
            start,
            stop,
            barcodes,
        } => {
            let Some(window) = read.get(*start..*stop) else {
                return Label::None;
            };
            barcodes
                .iter()
                .find(|(_, seq)| window.eq_ignore_ascii_case(seq))
                .map_or(Label::None, |(name, _)| Label::Barcode(name.clone()))
        }
        CompiledMatcher::FuzzyLookup {
            start,
            stop,
            barcodes,
        } => {
            let Some(window) = read.get(*start..*stop) else {
                return Label::None;
            };
            let mut hits = barcodes
                .iter()
                .filter(|(_, patterns)| patterns.iter().any(|p| p.matches(window)))
                .map(|(name, _)| name);
            match (hits.next(), hits.next()) {
                (None, _) => Label::None,
                (Some(name), None) => Label::Barcode(name.clone()),
                (Some(_), Some(_)) => Label::Ambiguous,
            }
        }
        CompiledMatcher::FlankCapture(capture) => scan_flanks(capture, read),
    }
}

fn scan_flanks(capture: &FlankCapture, read: &[u8]) -> Label {
    let mut spans: Vec<&[u8]> = Vec::new();
    for regex in &capture.captures {
        for caps in regex.captures_iter(read) {
            if let Some(span) = caps.get(1) {
                let span = span.as_bytes();
                if !spans.contains(&span) {
                    spans.push(span);
                }
            }
        }
    }

    match spans.as_slice() {
        [] => flanks_only(capture, read),
        [span] if span.is_empty() => flanks_only(capture, read),
        [span] => {
            let text = String::from_utf8_lossy(span);
            if !capture.translate {
                Label::Captured(text.into_owned())
            } else if span.len() % 3 == 0 {
                Label::Captured(translate(span))
            } else {
                Label::Captured(format!("({text})"))
            }
        }
        _ => Label::Ambiguous,
    }
}

/// `no_insertion` if both flanks occur somewhere in the read, `none` otherwise
fn flanks_only(capture: &FlankCapture, read: &[u8]) -> Label {
    let before = capture.before.iter().any(|r| r.is_match(read));
    let after = capture.after.iter().any(|r| r.is_match(read));
    if before && after {
        Label::NoInsertion
    } else {
        Label::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::{BarcodeSet, BarcodeSpec, ConstantSet, VariableSet};

    fn compile(sets: Vec<BarcodeSet>) -> MatcherSet {
        MatcherSet::compile(&BarcodeSpec::new(sets).unwrap()).unwrap()
    }

    fn labels(matchers: &MatcherSet, read: &[u8]) -> Vec<String> {
        scan_read(matchers, read)
            .unwrap()
            .into_iter()
            .map(Label::into_string)
            .collect()
    }

    fn constant_and_variable() -> MatcherSet {
        compile(vec![
            BarcodeSet::constant("S1", ConstantSet::new(0, [("A", "AC"), ("B", "GT")])),
            BarcodeSet::variable("S2", VariableSet::new("TT", "GG")),
        ])
    }

    #[test]
    fn test_constant_and_captured_labels() {
        assert_eq!(
            labels(&constant_and_variable(), b"ACTTAAGG"),
            vec!["A", "AA"]
        );
    }

    #[test]
    fn test_abutting_flanks_are_no_insertion() {
        let matchers = constant_and_variable();
        assert_eq!(labels(&matchers, b"GTTGGCCC"), vec!["B", "no_insertion"]);
        assert_eq!(labels(&matchers, b"GTCCCCCC"), vec!["B", "none"]);
        // Flanks present but in the wrong order
        assert_eq!(labels(&matchers, b"CCGGAATT"), vec!["none", "no_insertion"]);
    }

    #[test]
    fn test_exact_first_declared_barcode_wins() {
        let matchers = compile(vec![BarcodeSet::constant(
            "S1",
            ConstantSet::new(1, [("first", "CG"), ("second", "cg")]),
        )]);
        assert_eq!(labels(&matchers, b"ACGT"), vec!["first"]);
        assert_eq!(labels(&matchers, b"acgt"), vec!["first"]);
        assert_eq!(labels(&matchers, b"AAAA"), vec!["none"]);
    }

    #[test]
    fn test_short_read_is_none() {
        let matchers = compile(vec![
            BarcodeSet::constant("exact", ConstantSet::new(6, [("A", "ACGT")])),
            BarcodeSet::constant(
                "fuzzy",
                ConstantSet::new(6, [("A", "ACGT")]).with_mismatches(1),
            ),
        ]);
        assert_eq!(labels(&matchers, b"ACGTAC"), vec!["none", "none"]);
    }

    #[test]
    fn test_fuzzy_ambiguity_does_not_stop_later_sets() {
        let matchers = compile(vec![
            BarcodeSet::constant(
                "S1",
                ConstantSet::new(0, [("A", "AAAA"), ("B", "AAAT")]).with_mismatches(1),
            ),
            BarcodeSet::constant("S2", ConstantSet::new(4, [("C", "CC"), ("G", "GG")])),
        ]);
        assert_eq!(labels(&matchers, b"AAACGG"), vec!["ambiguous", "G"]);
        assert_eq!(labels(&matchers, b"AATTCC"), vec!["B", "C"]);
        assert_eq!(labels(&matchers, b"CCCCCC"), vec!["none", "C"]);
    }

    #[test]
    fn test_translated_capture() {
        let matchers = compile(vec![BarcodeSet::variable(
            "V",
            VariableSet::new("TT", "GG").with_translate(true),
        )]);
        assert_eq!(labels(&matchers, b"TTATGGCCGG"), vec!["MA"]);
        assert_eq!(labels(&matchers, b"TTatgcGG"), vec!["(atgc)"]);
    }

    #[test]
    fn test_capture_keeps_read_case() {
        let matchers = compile(vec![BarcodeSet::variable("V", VariableSet::new("TT", "GG"))]);
        assert_eq!(labels(&matchers, b"ttaCgGG"), vec!["aCg"]);
        assert_eq!(labels(&matchers, b"TTacgtGG"), vec!["acgt"]);
    }

    #[test]
    fn test_distinct_captures_are_ambiguous() {
        let matchers = compile(vec![BarcodeSet::variable(
            "V",
            VariableSet::new("CTC", "GAG").with_mismatches(1),
        )]);
        assert_eq!(labels(&matchers, b"CTCAAAGAG"), vec!["AAA"]);
        // `.TC` first matches ATC at the start, `C.C` and `CT.` only the later CTC
        assert_eq!(labels(&matchers, b"ATCGGGCTCAAAGAG"), vec!["ambiguous"]);
    }

    #[test]
    fn test_flank_mismatches_tolerated() {
        let matchers = compile(vec![BarcodeSet::variable(
            "V",
            VariableSet::new("GATC", "CCGG").with_mismatches(1),
        )]);
        assert_eq!(labels(&matchers, b"GTTCAAAACCGG"), vec!["AAAA"]);
    }
}
