use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::matching::engine::{CountingConfig, CountingEngine, RunStats, DEFAULT_BATCH_SIZE};
use crate::parsing::fastq::ReadSource;
use crate::parsing::spec::parse_spec_file;
use crate::report;

#[derive(Args)]
pub struct CountArgs {
    /// Input FASTQ file (gzip if it ends in .gz or .bgz); use '-' for stdin
    #[arg(short = 'i', long)]
    pub fastq: PathBuf,

    /// Barcode specification (YAML or JSON)
    #[arg(short, long)]
    pub barcodes: PathBuf,

    /// Forward primer used to orient reads
    #[arg(short, long)]
    pub primer: String,

    /// Output count table
    #[arg(short, long, default_value = "counts.tsv")]
    pub out: PathBuf,

    /// Worker threads (default: one per logical core)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Reads processed per parallel batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Directory for a per-read debug table (debug_info.tsv)
    #[arg(long)]
    pub debug_output: Option<PathBuf>,
}

/// Execute count subcommand
///
/// # Errors
///
/// Returns an error if the specification or primer is invalid, the input
/// cannot be read, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CountArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let spec = parse_spec_file(&args.barcodes)
        .with_context(|| format!("Failed to load barcode sets from {}", args.barcodes.display()))?;

    if verbose {
        eprintln!("Loaded {} barcode set(s):", spec.len());
        for set in spec.sets() {
            eprintln!("  {}", set.describe());
        }
    }

    let config = CountingConfig {
        threads: args.threads,
        batch_size: args.batch_size,
        keep_read_outcomes: args.debug_output.is_some(),
    };
    let engine = CountingEngine::new(&spec, &args.primer, config)?;

    let source = ReadSource::open(&args.fastq)
        .with_context(|| format!("Failed to open {}", args.fastq.display()))?;
    let result = engine.run(source)?;

    report::write_counts_file(&args.out, &result.set_names, &result.counts)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    let debug_table = match &args.debug_output {
        Some(dir) => Some(
            report::write_read_outcomes_file(dir, &result.outcomes)
                .with_context(|| format!("Failed to write debug table to {}", dir.display()))?,
        ),
        None => None,
    };

    if verbose {
        eprintln!(
            "Wrote {} combination(s) to {}",
            result.counts.rows().len(),
            args.out.display()
        );
        if let Some(path) = &debug_table {
            eprintln!("Wrote per-read table to {}", path.display());
        }
    }

    match format {
        OutputFormat::Text => print_text_summary(&result.stats, &args.out),
        OutputFormat::Json => print_json_summary(&result.stats, &args.out)?,
        OutputFormat::Tsv => print_tsv_summary(&result.stats),
    }

    Ok(())
}

fn print_text_summary(stats: &RunStats, out: &Path) {
    println!(
        "checked {} reads in total; {} of these were reversed",
        stats.checked, stats.reversed
    );
    println!(
        "dropped {} read(s) because the forward primer could not be identified in forward or reverse orientation",
        stats.no_primer
    );
    println!(
        "forward primer appeared more than once in {} read(s): if this number is high, consider re-running with a longer forward primer sequence",
        stats.ambiguous_primer
    );
    if stats.malformed > 0 {
        println!(
            "dropped {} read(s) containing bases other than A, C, G or T",
            stats.malformed
        );
    }
    println!("counts written to {}", out.display());
}

fn print_json_summary(stats: &RunStats, out: &Path) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "output": out.display().to_string(),
        "total": stats.total,
        "checked": stats.checked,
        "reversed": stats.reversed,
        "dropped": stats.dropped(),
        "no_primer": stats.no_primer,
        "ambiguous_primer": stats.ambiguous_primer,
        "malformed": stats.malformed,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_summary(stats: &RunStats) {
    println!("total\tchecked\treversed\tdropped\tno_primer\tambiguous_primer\tmalformed");
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        stats.total,
        stats.checked,
        stats.reversed,
        stats.dropped(),
        stats.no_primer,
        stats.ambiguous_primer,
        stats.malformed
    );
}
