use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::spec::{BarcodeSpec, SetSpec};
use crate::parsing::spec::parse_spec_file;

#[derive(Args)]
pub struct ValidateArgs {
    /// Barcode specification (YAML or JSON)
    #[arg(short, long)]
    pub barcodes: PathBuf,
}

/// Execute validate subcommand
///
/// # Errors
///
/// Returns an error listing every problem if the specification is invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let spec = parse_spec_file(&args.barcodes)?;

    if verbose {
        eprintln!(
            "Loaded {} barcode set(s) from {}",
            spec.len(),
            args.barcodes.display()
        );
    }

    match format {
        OutputFormat::Text => print_text_spec(&spec),
        OutputFormat::Json => print_json_spec(&spec)?,
        OutputFormat::Tsv => print_tsv_spec(&spec),
    }

    Ok(())
}

fn print_text_spec(spec: &BarcodeSpec) {
    println!("Specification is valid: {} barcode set(s)", spec.len());
    for set in spec.sets() {
        println!("  {}", set.describe());
    }
}

fn print_json_spec(spec: &BarcodeSpec) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(spec)?);
    Ok(())
}

fn print_tsv_spec(spec: &BarcodeSpec) {
    println!("name\ttype\tstart\tbarcodes\tlength\tmismatches\tbefore\tafter\ttranslate");
    for set in spec.sets() {
        match &set.spec {
            SetSpec::Constant(c) => println!(
                "{}\tconstant\t{}\t{}\t{}\t{}\t\t\t",
                set.name,
                c.start,
                c.barcodes.len(),
                c.barcode_length(),
                c.mismatches
            ),
            SetSpec::Variable(v) => println!(
                "{}\tvariable\t\t\t\t{}/{}\t{}\t{}\t{}",
                set.name,
                v.before_mismatches,
                v.after_mismatches,
                v.before,
                v.after,
                v.translate
            ),
        }
    }
}
