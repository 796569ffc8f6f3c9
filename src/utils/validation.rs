//! Centralized validation and helper functions.

/// Maximum number of wildcard patterns a single constant set may expand to
/// (guards against runaway `C(len, mismatches)` expansion).
pub const MAX_PATTERNS_PER_SET: usize = 1_000_000;

/// Maximum number of before/after regex pairs a single variable set may expand to
pub const MAX_FLANK_PAIRS: usize = 10_000;

/// Check that a string is a non-empty nucleotide sequence over `{A, C, G, T}`
/// (case-insensitive).
///
/// # Examples
///
/// ```
/// use barcode_counter::utils::validation::is_nucleotide_sequence;
///
/// assert!(is_nucleotide_sequence("ACGT"));
/// assert!(is_nucleotide_sequence("acgt"));
/// assert!(!is_nucleotide_sequence("ACGN"));
/// assert!(!is_nucleotide_sequence(""));
/// ```
#[must_use]
pub fn is_nucleotide_sequence(s: &str) -> bool {
    !s.is_empty() && first_invalid_base(s.as_bytes()).is_none()
}

/// Return the position and value of the first byte outside `{A, C, G, T, a, c, g, t}`.
#[must_use]
pub fn first_invalid_base(seq: &[u8]) -> Option<(usize, u8)> {
    seq.iter()
        .enumerate()
        .find(|(_, b)| !matches!(b, b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't'))
        .map(|(i, b)| (i, *b))
}

/// Interpret a boolean-like string (`"true"` / `"false"`, case-insensitive).
#[must_use]
pub fn parse_bool_like(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Binomial coefficient `C(n, k)`, or `None` on overflow.
#[must_use]
pub fn binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        // Exact at every step: result * (n - i) is divisible by (i + 1)
        result = result.checked_mul(n - i)? / (i + 1);
    }
    Some(result)
}

/// Check whether expanding a set to `count` patterns stays within `limit`.
///
/// Returns an error message if the limit would be exceeded, None if safe.
#[must_use]
pub fn check_pattern_limit(set_name: &str, count: Option<usize>, limit: usize) -> Option<String> {
    match count {
        Some(n) if n <= limit => None,
        Some(n) => Some(format!(
            "Set '{set_name}' expands to {n} patterns, exceeding the maximum of {limit}; \
             reduce the number of mismatches"
        )),
        None => Some(format!(
            "Set '{set_name}' expands to more patterns than can be counted; \
             reduce the number of mismatches"
        )),
    }
}
