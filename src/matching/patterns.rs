//! Mismatch-tolerant wildcard patterns.
//!
//! A sequence of length `n` allowing `m` substitutions is expanded to the
//! `C(n, m)` patterns obtained by replacing every choice of `m` positions with a
//! wildcard. A window with at most `m` substitutions relative to the sequence
//! matches at least one of them, because some choice of wildcard positions
//! covers every position that differs.
//!
//! Position subsets are generated iteratively in lexicographic order, so the
//! expansion needs no regex engine and allocates one pattern per subset.

/// Fixed-length pattern in which `None` positions match any base
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WildcardPattern {
    bases: Vec<Option<u8>>,
}

impl WildcardPattern {
    /// Pattern matching exactly `seq` (case-insensitive)
    pub fn exact(seq: &[u8]) -> Self {
        Self {
            bases: seq.iter().map(|b| Some(b.to_ascii_uppercase())).collect(),
        }
    }

    /// Copy of `seq` with wildcards at `positions`
    pub fn with_wildcards(seq: &[u8], positions: &[usize]) -> Self {
        let mut pattern = Self::exact(seq);
        for &i in positions {
            pattern.bases[i] = None;
        }
        pattern
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Number of wildcard positions
    pub fn wildcards(&self) -> usize {
        self.bases.iter().filter(|b| b.is_none()).count()
    }

    /// `true` if `window` has the pattern's length and agrees at every
    /// non-wildcard position (case-insensitive)
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.bases.len()
            && self
                .bases
                .iter()
                .zip(window)
                .all(|(p, w)| p.map_or(true, |p| p == w.to_ascii_uppercase()))
    }

    /// Regex fragment for this pattern (`.` for wildcards)
    pub fn to_regex(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for base in &self.bases {
            match base {
                Some(b) => write!(f, "{}", char::from(*b))?,
                None => write!(f, ".")?,
            }
        }
        Ok(())
    }
}

/// Iterator over every `k`-subset of `0..n`, as sorted index vectors in
/// lexicographic order
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
    started: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
            started: false,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        let k = self.indices.len();
        // Rightmost index that can still move right
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
            self.done = true;
            return None;
        };
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

/// Expand `seq` into every pattern with exactly `mismatches` wildcard positions.
///
/// Duplicates cannot arise within one sequence since each position subset is
/// distinct. `mismatches == 0` yields the single exact pattern; `mismatches >
/// seq.len()` yields nothing.
///
/// # Examples
///
/// ```
/// use barcode_counter::matching::patterns::expand_mismatches;
///
/// let patterns: Vec<String> = expand_mismatches(b"ACG", 1).iter().map(|p| p.to_string()).collect();
/// assert_eq!(patterns, vec![".CG", "A.G", "AC."]);
/// ```
pub fn expand_mismatches(seq: &[u8], mismatches: usize) -> Vec<WildcardPattern> {
    Combinations::new(seq.len(), mismatches)
        .map(|positions| WildcardPattern::with_wildcards(seq, &positions))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::binomial;
    use rand::rngs::StdRng;
    use rand::seq::index::sample;
    use rand::{Rng, SeedableRng};

    const BASES: &[u8] = b"ACGT";

    #[test]
    fn test_combinations() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Combinations::new(3, 3).count(), 1);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn test_combination_counts_match_binomial() {
        for n in 0..10 {
            for k in 0..=n {
                assert_eq!(Some(Combinations::new(n, k).count()), binomial(n, k));
            }
        }
    }

    #[test]
    fn test_pattern_matching() {
        let p = WildcardPattern::with_wildcards(b"ACGT", &[1]);
        assert_eq!(p.to_string(), "A.GT");
        assert_eq!(p.wildcards(), 1);
        assert!(p.matches(b"ATGT"));
        assert!(p.matches(b"acgt"));
        assert!(!p.matches(b"ACGA"));
        assert!(!p.matches(b"ACG")); // wrong length
    }

    #[test]
    fn test_zero_mismatches_is_exact() {
        let patterns = expand_mismatches(b"ACGT", 0);
        assert_eq!(patterns, vec![WildcardPattern::exact(b"ACGT")]);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let window: Vec<u8> = (0..4).map(|_| BASES[rng.gen_range(0..4)]).collect();
            assert_eq!(patterns[0].matches(&window), window == b"ACGT");
        }
    }

    #[test]
    fn test_substituted_windows_always_match() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..300 {
            let len = rng.gen_range(1..12);
            let m = rng.gen_range(0..=len.min(4));
            let barcode: Vec<u8> = (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect();
            let patterns = expand_mismatches(&barcode, m);

            // Inject k <= m substitutions at distinct positions
            let k = rng.gen_range(0..=m);
            let mut window = barcode.clone();
            for pos in sample(&mut rng, len, k) {
                let original = window[pos];
                let replacement = loop {
                    let b = BASES[rng.gen_range(0..4)];
                    if b != original {
                        break b;
                    }
                };
                window[pos] = replacement;
            }

            assert!(
                patterns.iter().any(|p| p.matches(&window)),
                "window {} with {k} substitutions missed barcode {} (m = {m})",
                String::from_utf8_lossy(&window),
                String::from_utf8_lossy(&barcode),
            );
        }
    }

    #[test]
    fn test_too_many_substitutions_do_not_match() {
        let patterns = expand_mismatches(b"AAAA", 1);
        assert!(!patterns.iter().any(|p| p.matches(b"ACCA")));
    }
}
