//! Per-run counting driver.
//!
//! Reads are pulled from the source in batches. Each batch is oriented, scanned
//! and counted in parallel inside a dedicated rayon pool, with every fold
//! owning a private [`CountTree`] and [`RunStats`] shard. Shards are merged in
//! sequence order, so the first-observation order of labels (and therefore the
//! row order of the report) is the same for any number of threads.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::counts::{CountError, CountTree};
use crate::core::sequence::SequenceError;
use crate::core::spec::BarcodeSpec;
use crate::core::types::{DropReason, Label, Orientation};
use crate::matching::compiler::{CompileError, MatcherSet};
use crate::matching::orientation::{OrientationResolver, Resolution};
use crate::matching::scanner::{scan_read, ScanError};
use crate::parsing::fastq::{Read, ReadError};

/// Default number of reads handed to the pool at a time
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid forward primer: {0}")]
    Primer(#[source] SequenceError),

    #[error("Failed to compile barcode sets: {0}")]
    Compile(#[from] CompileError),

    #[error("Read '{read_id}' produced {found} label(s) for {expected} barcode set(s)")]
    ScanInvariant {
        read_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Counting failed: {0}")]
    Count(#[from] CountError),

    #[error("Failed to read input: {0}")]
    Read(#[from] ReadError),

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

/// Configuration for the counting engine
#[derive(Debug, Clone)]
pub struct CountingConfig {
    /// Worker threads (`None` for one per logical core)
    pub threads: Option<usize>,
    /// Reads processed per parallel batch
    pub batch_size: usize,
    /// Keep the outcome of every read (for the debug table)
    pub keep_read_outcomes: bool,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: DEFAULT_BATCH_SIZE,
            keep_read_outcomes: false,
        }
    }
}

/// Summary counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Reads pulled from the source
    pub total: u64,
    /// Reads that were oriented and scanned
    pub checked: u64,
    /// Scanned reads that had to be reverse-complemented
    pub reversed: u64,
    pub no_primer: u64,
    pub ambiguous_primer: u64,
    pub malformed: u64,
}

impl RunStats {
    /// Reads excluded from counting for any reason
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.no_primer + self.ambiguous_primer + self.malformed
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.total += other.total;
        self.checked += other.checked;
        self.reversed += other.reversed;
        self.no_primer += other.no_primer;
        self.ambiguous_primer += other.ambiguous_primer;
        self.malformed += other.malformed;
    }

    fn record(&mut self, outcome: &ReadOutcome) {
        self.total += 1;
        match outcome {
            ReadOutcome::Counted { orientation, .. } => {
                self.checked += 1;
                if orientation.is_flipped() {
                    self.reversed += 1;
                }
            }
            ReadOutcome::Dropped(DropReason::NoPrimer) => self.no_primer += 1,
            ReadOutcome::Dropped(DropReason::AmbiguousPrimer) => self.ambiguous_primer += 1,
            ReadOutcome::Dropped(DropReason::Malformed) => self.malformed += 1,
        }
    }
}

/// What happened to one read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    Counted {
        orientation: Orientation,
        labels: Vec<Label>,
    },
    Dropped(DropReason),
}

/// Outcome of a read, tagged with its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRecord {
    pub read_id: String,
    pub outcome: ReadOutcome,
}

/// Everything a finished run produces
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Set names in specification order
    pub set_names: Vec<String>,
    pub counts: CountTree,
    pub stats: RunStats,
    /// Per-read outcomes in input order (empty unless requested)
    pub outcomes: Vec<ReadRecord>,
}

/// Partial result of one fold
struct Shard {
    counts: CountTree,
    stats: RunStats,
    outcomes: Vec<ReadRecord>,
}

impl Shard {
    fn new(depth: usize) -> Self {
        Self {
            counts: CountTree::new(depth),
            stats: RunStats::default(),
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, read: &Read, outcome: ReadOutcome, keep: bool) -> Result<(), EngineError> {
        if let ReadOutcome::Counted { labels, .. } = &outcome {
            let path: Vec<&str> = labels.iter().map(Label::as_str).collect();
            self.counts.increment(&path)?;
        }
        self.stats.record(&outcome);
        if keep {
            self.outcomes.push(ReadRecord {
                read_id: read.id.clone(),
                outcome,
            });
        }
        Ok(())
    }

    /// Append `other`, which covers reads after those in `self`
    fn merge(mut self, other: Shard) -> Result<Self, EngineError> {
        self.counts.merge(&other.counts)?;
        self.stats.merge(&other.stats);
        self.outcomes.extend(other.outcomes);
        Ok(self)
    }
}

/// Orients, scans and counts reads against a compiled specification
pub struct CountingEngine {
    matchers: MatcherSet,
    resolver: OrientationResolver,
    config: CountingConfig,
    pool: ThreadPool,
}

impl CountingEngine {
    /// Compile `spec` and prepare a worker pool.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Primer` for an empty or non-nucleotide primer,
    /// `EngineError::Compile` if a set cannot be compiled, or
    /// `EngineError::ThreadPool` if the worker threads cannot be started.
    pub fn new(
        spec: &BarcodeSpec,
        primer: &str,
        config: CountingConfig,
    ) -> Result<Self, EngineError> {
        let resolver = OrientationResolver::new(primer).map_err(EngineError::Primer)?;
        for set in spec.sets() {
            debug!("{}", set.describe());
        }
        let matchers = MatcherSet::compile(spec)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .build()?;
        debug!("Counting with {} thread(s)", pool.current_num_threads());

        Ok(Self {
            matchers,
            resolver,
            config,
            pool,
        })
    }

    pub fn matchers(&self) -> &MatcherSet {
        &self.matchers
    }

    pub fn config(&self) -> &CountingConfig {
        &self.config
    }

    /// Orient and scan a single read.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ScanInvariant` if scanning yields the wrong number
    /// of labels.
    pub fn process_read(&self, read: &Read) -> Result<ReadOutcome, EngineError> {
        match self.resolver.resolve(&read.sequence) {
            Resolution::Dropped(reason) => {
                if reason == DropReason::Malformed {
                    warn!(
                        "Dropping read {}: sequence contains non-ACGT bases and cannot be reverse-complemented",
                        read.id
                    );
                }
                Ok(ReadOutcome::Dropped(reason))
            }
            Resolution::Oriented(oriented) => match scan_read(&self.matchers, &oriented.sequence) {
                Ok(labels) => Ok(ReadOutcome::Counted {
                    orientation: oriented.orientation,
                    labels,
                }),
                Err(ScanError::LabelCount { expected, found }) => Err(EngineError::ScanInvariant {
                    read_id: read.id.clone(),
                    expected,
                    found,
                }),
            },
        }
    }

    /// Consume `reads` and count every label combination.
    ///
    /// Nothing is returned until the whole source has been consumed; any error
    /// aborts the run.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Read` if the source fails, or
    /// `EngineError::ScanInvariant` / `EngineError::Count` on an internal
    /// counting defect.
    pub fn run<I>(&self, reads: I) -> Result<RunResult, EngineError>
    where
        I: IntoIterator<Item = Result<Read, ReadError>>,
    {
        let batch_size = self.config.batch_size.max(1);
        let mut totals = Shard::new(self.matchers.len());
        let mut batch = Vec::with_capacity(batch_size);

        for read in reads {
            batch.push(read?);
            if batch.len() == batch_size {
                totals = totals.merge(self.process_batch(&batch)?)?;
                batch.clear();
                debug!("Processed {} reads", totals.stats.total);
            }
        }
        if !batch.is_empty() {
            totals = totals.merge(self.process_batch(&batch)?)?;
        }

        let stats = totals.stats;
        info!(
            "Checked {} reads in total; {} of these were reversed",
            stats.checked, stats.reversed
        );
        info!(
            "Dropped {} read(s): {} without the forward primer, {} with a repeated primer, {} malformed",
            stats.dropped(),
            stats.no_primer,
            stats.ambiguous_primer,
            stats.malformed
        );
        if stats.ambiguous_primer > 0 {
            warn!(
                "Forward primer appeared more than once in {} read(s); if this number is high, consider a longer primer",
                stats.ambiguous_primer
            );
        }

        Ok(RunResult {
            set_names: self.matchers.names(),
            counts: totals.counts,
            stats,
            outcomes: totals.outcomes,
        })
    }

    fn process_batch(&self, batch: &[Read]) -> Result<Shard, EngineError> {
        let depth = self.matchers.len();
        let keep = self.config.keep_read_outcomes;
        self.pool.install(|| {
            batch
                .par_iter()
                .try_fold(
                    || Shard::new(depth),
                    |mut shard, read| -> Result<Shard, EngineError> {
                        let outcome = self.process_read(read)?;
                        shard.record(read, outcome, keep)?;
                        Ok(shard)
                    },
                )
                .try_reduce(|| Shard::new(depth), Shard::merge)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::reverse_complement;
    use crate::core::spec::{BarcodeSet, ConstantSet, VariableSet};

    const PRIMER: &str = "CCCC";

    fn spec() -> BarcodeSpec {
        BarcodeSpec::new(vec![
            BarcodeSet::constant("S1", ConstantSet::new(0, [("A", "AC"), ("B", "GT")])),
            BarcodeSet::variable("S2", VariableSet::new("TT", "GG")),
        ])
        .unwrap()
    }

    fn engine(config: CountingConfig) -> CountingEngine {
        CountingEngine::new(&spec(), PRIMER, config).unwrap()
    }

    fn reads(seqs: &[&[u8]]) -> Vec<Result<Read, ReadError>> {
        seqs.iter()
            .enumerate()
            .map(|(i, s)| Ok(Read::new(format!("r{i}"), s.to_vec())))
            .collect()
    }

    #[test]
    fn test_process_read_outcomes() {
        let engine = engine(CountingConfig::default());

        let counted = engine
            .process_read(&Read::new("r", b"ACTTAAGGCCCC".to_vec()))
            .unwrap();
        assert_eq!(
            counted,
            ReadOutcome::Counted {
                orientation: Orientation::Forward,
                labels: vec![Label::Barcode("A".into()), Label::Captured("AA".into())],
            }
        );

        let dropped = engine
            .process_read(&Read::new("r", b"ACTTAAGG".to_vec()))
            .unwrap();
        assert_eq!(dropped, ReadOutcome::Dropped(DropReason::NoPrimer));
    }

    #[test]
    fn test_run_counts_and_stats() {
        let flipped = reverse_complement(b"GTTTCCGGCCCC").unwrap();
        let input = reads(&[
            b"ACTTAAGGCCCC",
            b"ACTTAAGGCCCC",
            &flipped,
            b"ACGTACGTACGT",
            b"CCCCACCCCC",
            b"NNNN",
        ]);

        let result = engine(CountingConfig::default()).run(input).unwrap();
        assert_eq!(result.set_names, vec!["S1", "S2"]);
        assert_eq!(result.counts.get(&["A", "AA"]), Some(2));
        assert_eq!(result.counts.get(&["B", "TCC"]), Some(1));
        assert_eq!(result.counts.total(), result.stats.checked);

        assert_eq!(
            result.stats,
            RunStats {
                total: 6,
                checked: 3,
                reversed: 1,
                no_primer: 1,
                ambiguous_primer: 1,
                malformed: 1,
            }
        );
        assert_eq!(result.stats.dropped(), 3);
        assert!(result.outcomes.is_empty());
    }

    #[test]
    fn test_row_order_independent_of_threads() {
        let seqs: Vec<Vec<u8>> = (0..500)
            .map(|i| match i % 3 {
                0 => b"GTTTAGGCCCC".to_vec(),
                1 => b"ACTTCGGCCCC".to_vec(),
                _ => b"TTTTTTTCCCC".to_vec(),
            })
            .collect();
        let run = |threads, batch_size| {
            let config = CountingConfig {
                threads: Some(threads),
                batch_size,
                keep_read_outcomes: true,
            };
            let input = seqs
                .iter()
                .enumerate()
                .map(|(i, s)| Ok(Read::new(format!("r{i}"), s.clone())));
            engine(config).run(input).unwrap()
        };

        let sequential = run(1, 1000);
        let parallel = run(4, 7);
        let rows = |r: &RunResult| -> Vec<(Vec<String>, u64)> {
            r.counts
                .rows()
                .into_iter()
                .map(|(p, c)| (p.into_iter().map(String::from).collect(), c))
                .collect()
        };
        assert_eq!(rows(&sequential), rows(&parallel));
        assert_eq!(sequential.stats, parallel.stats);
        assert_eq!(parallel.outcomes.len(), 500);
        assert_eq!(parallel.outcomes[499].read_id, "r499");
    }

    #[test]
    fn test_read_error_aborts_run() {
        let input = vec![
            Ok(Read::new("r0", b"ACTTAAGGCCCC".to_vec())),
            Err(ReadError::Io(std::io::Error::other("truncated"))),
        ];
        let result = engine(CountingConfig::default()).run(input);
        assert!(matches!(result, Err(EngineError::Read(_))));
    }

    #[test]
    fn test_invalid_primer_rejected() {
        let result = CountingEngine::new(&spec(), "CCNC", CountingConfig::default());
        assert!(matches!(result, Err(EngineError::Primer(_))));
    }
}
