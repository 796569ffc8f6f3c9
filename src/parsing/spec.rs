//! Parser for barcode specification documents.
//!
//! The document is a YAML (or JSON) list in which every entry maps a single set
//! name to its definition:
//!
//! ```yaml
//! - sample:
//!     type: constant
//!     start: 0
//!     mismatches: 1
//!     barcodes:
//!       bc1: ACGTAC
//!       bc2: TGCATG
//! - insert:
//!     type: variable
//!     before: TTGACA
//!     after: GGATCC
//!     translate: true
//! ```
//!
//! Every violation found is reported; parsing never yields a partially valid
//! specification.

use std::collections::HashSet;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::core::spec::{BarcodeSet, BarcodeSpec, ConstantSet, VariableSet};
use crate::utils::validation::parse_bool_like;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid barcode specification: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl SpecError {
    /// Individual validation messages (empty for IO/YAML errors)
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Invalid(messages) => messages,
            _ => &[],
        }
    }
}

/// Parse a barcode specification file
///
/// # Errors
///
/// Returns `SpecError::Io` if the file cannot be read, `SpecError::Yaml` if it is
/// not valid YAML, or `SpecError::Invalid` with every violation found.
pub fn parse_spec_file(path: &Path) -> Result<BarcodeSpec, SpecError> {
    let content = std::fs::read_to_string(path)?;
    parse_spec_text(&content)
}

/// Parse a barcode specification from YAML/JSON text
///
/// # Errors
///
/// Returns `SpecError::Yaml` if the text is not valid YAML, or
/// `SpecError::Invalid` with every violation found.
pub fn parse_spec_text(text: &str) -> Result<BarcodeSpec, SpecError> {
    let doc: Value = serde_yaml::from_str(text)?;
    let Value::Sequence(entries) = doc else {
        return Err(SpecError::Invalid(vec![
            "Specification must be a list of barcode sets".to_string(),
        ]));
    };

    let mut errors = Vec::new();
    let mut sets = Vec::new();
    let mut names = HashSet::new();

    for (i, entry) in entries.iter().enumerate() {
        // 1-based for user friendliness
        let position = i + 1;

        let Value::Mapping(map) = entry else {
            errors.push(format!(
                "Entry {position} must map a set name to its definition"
            ));
            continue;
        };
        if map.len() != 1 {
            errors.push(format!(
                "Entry {position} must contain exactly one set name (found {})",
                map.len()
            ));
            continue;
        }
        let Some((key, body)) = map.iter().next() else {
            continue;
        };
        let Some(name) = scalar_to_string(key) else {
            errors.push(format!("Entry {position} has a set name that is not a string"));
            continue;
        };
        let duplicate = !names.insert(name.clone());
        if duplicate {
            errors.push(format!(
                "Duplicate set name '{name}': please specify unique names for each barcode set"
            ));
        }

        // Duplicates are still validated but never kept
        match parse_set(&name, body) {
            Ok(set) => {
                let violations = set.validate();
                if !violations.is_empty() {
                    errors.extend(violations);
                } else if !duplicate {
                    sets.push(set);
                }
            }
            Err(violations) => errors.extend(violations),
        }
    }

    if !errors.is_empty() {
        return Err(SpecError::Invalid(errors));
    }

    BarcodeSpec::new(sets).map_err(SpecError::Invalid)
}

fn parse_set(name: &str, body: &Value) -> Result<BarcodeSet, Vec<String>> {
    let Value::Mapping(map) = body else {
        return Err(vec![format!(
            "Set '{name}' must be a mapping with a 'type' field"
        )]);
    };

    match map.get("type").and_then(Value::as_str) {
        Some("constant") => parse_constant(name, map),
        Some("variable") => parse_variable(name, map),
        Some(other) => Err(vec![format!(
            "Set '{name}' has unknown type '{other}': expected 'constant' or 'variable'"
        )]),
        None => Err(vec![format!(
            "Set '{name}' must specify a type of 'constant' or 'variable'"
        )]),
    }
}

fn parse_constant(name: &str, map: &Mapping) -> Result<BarcodeSet, Vec<String>> {
    let mut errors = Vec::new();

    let start = match non_negative_field(name, map, "start") {
        Ok(Some(start)) => Some(start),
        Ok(None) => {
            errors.push(format!("Constant set '{name}' must contain a 'start'"));
            None
        }
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let mismatches = non_negative_field(name, map, "mismatches").unwrap_or_else(|e| {
        errors.push(e);
        None
    });

    let mut barcodes = Vec::new();
    match map.get("barcodes") {
        Some(Value::Mapping(entries)) if !entries.is_empty() => {
            for (key, value) in entries {
                match (scalar_to_string(key), value.as_str()) {
                    (Some(barcode), Some(seq)) => barcodes.push((barcode, seq.to_string())),
                    (Some(barcode), None) => errors.push(format!(
                        "Barcode '{barcode}' in set '{name}' must be a nucleotide sequence"
                    )),
                    (None, _) => errors.push(format!(
                        "Set '{name}' contains a barcode whose name is not a string"
                    )),
                }
            }
        }
        Some(Value::Mapping(_)) => errors.push(format!(
            "Constant set '{name}' must contain at least one barcode"
        )),
        Some(_) => errors.push(format!(
            "'barcodes' in set '{name}' must be a mapping of barcode names to sequences"
        )),
        None => errors.push(format!(
            "Constant set '{name}' must contain a list of barcodes"
        )),
    }

    match (start, errors.is_empty()) {
        (Some(start), true) => Ok(BarcodeSet::constant(
            name,
            ConstantSet::new(start, barcodes).with_mismatches(mismatches.unwrap_or(0)),
        )),
        _ => Err(errors),
    }
}

fn parse_variable(name: &str, map: &Mapping) -> Result<BarcodeSet, Vec<String>> {
    let mut errors = Vec::new();

    let mut flank = |field: &str| match map.get(field) {
        Some(Value::String(seq)) => Some(seq.clone()),
        Some(_) => {
            errors.push(format!(
                "'{field}' in set '{name}' must be a nucleotide sequence"
            ));
            None
        }
        None => {
            errors.push(format!(
                "Variable set '{name}' must specify the '{field}' sequence flanking the variable region"
            ));
            None
        }
    };
    let before = flank("before");
    let after = flank("after");

    let mut count = |field: &str| {
        non_negative_field(name, map, field).unwrap_or_else(|e| {
            errors.push(e);
            None
        })
    };
    let shared = count("mismatches").unwrap_or(0);
    let before_mismatches = count("before_mismatches").unwrap_or(shared);
    let after_mismatches = count("after_mismatches").unwrap_or(shared);

    let translate = match map.get("translate") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => parse_bool_like(s).unwrap_or_else(|| {
            errors.push(format!(
                "Couldn't understand '{s}' in translate field of set '{name}': please enter 'true' or 'false'"
            ));
            false
        }),
        Some(_) => {
            errors.push(format!(
                "Translate field of set '{name}' must be 'true' or 'false'"
            ));
            false
        }
    };

    match (before, after, errors.is_empty()) {
        (Some(before), Some(after), true) => {
            let mut set = VariableSet::new(before, after).with_translate(translate);
            set.before_mismatches = before_mismatches;
            set.after_mismatches = after_mismatches;
            Ok(BarcodeSet::variable(name, set))
        }
        _ => Err(errors),
    }
}

/// Read an optional non-negative integer field
fn non_negative_field(name: &str, map: &Mapping, field: &str) -> Result<Option<usize>, String> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                format!("'{field}' in set '{name}' must be a non-negative integer")
            }),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::SetSpec;

    const VALID: &str = r"
- S1:
    type: constant
    start: 0
    barcodes:
      A: AC
      B: gt
- S2:
    type: variable
    before: TT
    after: GG
";

    #[test]
    fn test_parse_valid_spec() {
        let spec = parse_spec_text(VALID).unwrap();
        assert_eq!(spec.names(), vec!["S1", "S2"]);

        let SetSpec::Constant(s1) = &spec.sets()[0].spec else {
            panic!("S1 should be constant");
        };
        assert_eq!(s1.start, 0);
        assert_eq!(s1.mismatches, 0);
        assert_eq!(
            s1.barcodes,
            vec![
                ("A".to_string(), "AC".to_string()),
                ("B".to_string(), "GT".to_string())
            ]
        );

        let SetSpec::Variable(s2) = &spec.sets()[1].spec else {
            panic!("S2 should be variable");
        };
        assert!(!s2.translate);
        assert_eq!(s2.before_mismatches, 0);
    }

    #[test]
    fn test_barcode_order_is_preserved() {
        let yaml = r"
- S1:
    type: constant
    start: 2
    barcodes:
      zeta: AAA
      alpha: CCC
      mid: GGG
";
        let spec = parse_spec_text(yaml).unwrap();
        let SetSpec::Constant(s1) = &spec.sets()[0].spec else {
            panic!("S1 should be constant");
        };
        let names: Vec<_> = s1.barcodes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_translate_string_and_bool() {
        let yaml = r#"
- V1:
    type: variable
    before: TT
    after: GG
    translate: "TRUE"
- V2:
    type: variable
    before: TT
    after: GG
    translate: false
"#;
        let spec = parse_spec_text(yaml).unwrap();
        let flags: Vec<bool> = spec
            .sets()
            .iter()
            .map(|s| match &s.spec {
                SetSpec::Variable(v) => v.translate,
                SetSpec::Constant(_) => unreachable!(),
            })
            .collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_per_flank_mismatches() {
        let yaml = r"
- V:
    type: variable
    before: TTTT
    after: GGG
    mismatches: 1
    after_mismatches: 2
";
        let spec = parse_spec_text(yaml).unwrap();
        let SetSpec::Variable(v) = &spec.sets()[0].spec else {
            panic!("V should be variable");
        };
        assert_eq!(v.before_mismatches, 1);
        assert_eq!(v.after_mismatches, 2);
    }

    #[test]
    fn test_collects_errors_across_sets() {
        let yaml = r"
- S1:
    type: constant
    barcodes:
      A: AC
- S1:
    type: variable
    before: TT
    after: GG
- S3:
    type: other
- S4:
    type: variable
    before: TTN
    translate: maybe
";
        let err = parse_spec_text(yaml).unwrap_err();
        let messages = err.messages();
        assert!(messages.iter().any(|m| m.contains("must contain a 'start'")));
        assert!(messages.iter().any(|m| m.contains("Duplicate set name 'S1'")));
        assert!(messages.iter().any(|m| m.contains("unknown type 'other'")));
        assert!(messages.iter().any(|m| m.contains("'after' sequence")));
        assert!(messages.iter().any(|m| m.contains("Couldn't understand 'maybe'")));
    }

    #[test]
    fn test_duplicate_set_body_still_validated() {
        let yaml = r"
- S1:
    type: variable
    before: TT
    after: GG
- S1:
    type: constant
    start: 0
    barcodes:
      A: AC
      B: ACG
";
        let err = parse_spec_text(yaml).unwrap_err();
        let messages = err.messages();
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert!(messages[0].contains("Duplicate set name 'S1'"));
        assert!(messages[1].contains("same length"));
    }

    #[test]
    fn test_start_overflowing_window_rejected() {
        let yaml = r"
- S1:
    type: constant
    start: 18446744073709551615
    barcodes:
      A: AC
";
        let err = parse_spec_text(yaml).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("too large"));
    }

    #[test]
    fn test_negative_start_rejected() {
        let yaml = r"
- S1:
    type: constant
    start: -1
    barcodes:
      A: AC
";
        let err = parse_spec_text(yaml).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("non-negative integer"));
    }

    #[test]
    fn test_unequal_lengths_and_excess_mismatches() {
        let yaml = r"
- S1:
    type: constant
    start: 0
    barcodes:
      A: AC
      B: ACG
- S2:
    type: constant
    start: 0
    mismatches: 3
    barcodes:
      A: AC
";
        let err = parse_spec_text(yaml).unwrap_err();
        let messages = err.messages();
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert!(messages[0].contains("same length"));
        assert!(messages[1].contains("must not be greater"));
    }

    #[test]
    fn test_entry_shape_rules() {
        let err = parse_spec_text("S1: {type: constant}").unwrap_err();
        assert!(err.messages()[0].contains("must be a list"));

        let yaml = r"
- S1:
    type: variable
    before: TT
    after: GG
  S2:
    type: variable
    before: TT
    after: GG
";
        let err = parse_spec_text(yaml).unwrap_err();
        assert!(err.messages()[0].contains("exactly one set name"));
    }

    #[test]
    fn test_json_is_accepted() {
        let json = r#"[{"S1": {"type": "constant", "start": 3, "barcodes": {"A": "ACGT"}}}]"#;
        let spec = parse_spec_text(json).unwrap();
        assert_eq!(spec.len(), 1);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            parse_spec_text("- S1: [unclosed"),
            Err(SpecError::Yaml(_))
        ));
    }
}
