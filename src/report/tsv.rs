//! Tab-separated writers for the count table and the per-read debug table.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::counts::CountTree;
use crate::matching::engine::{ReadOutcome, ReadRecord};

/// File name of the per-read table inside the debug directory
pub const DEBUG_TABLE_NAME: &str = "debug_info.tsv";

/// Separator between labels in the debug table's `barcodes` column
const LABEL_SEPARATOR: &str = "__";

const MISSING: &str = "NA";

/// Write the count table: a header of set names plus `count`, then one row per
/// root-to-leaf path of `counts` in traversal order.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_counts<W: Write>(
    mut writer: W,
    set_names: &[String],
    counts: &CountTree,
) -> io::Result<()> {
    writeln!(writer, "{}\tcount", set_names.join("\t"))?;
    for (labels, count) in counts.rows() {
        writeln!(writer, "{}\t{count}", labels.join("\t"))?;
    }
    writer.flush()
}

/// Write the count table to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created, written or renamed.
pub fn write_counts_file(path: &Path, set_names: &[String], counts: &CountTree) -> io::Result<()> {
    write_atomically(path, |writer| write_counts(writer, set_names, counts))?;
    debug!("Wrote {} combination(s) to {}", counts.rows().len(), path.display());
    Ok(())
}

/// Write the per-read table with columns `read_name`, `dropped`, `reversed`
/// and `barcodes` (labels joined with `__`). Fields that do not apply to
/// dropped reads are `NA`.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_read_outcomes<W: Write>(mut writer: W, outcomes: &[ReadRecord]) -> io::Result<()> {
    writeln!(writer, "read_name\tdropped\treversed\tbarcodes")?;
    for record in outcomes {
        match &record.outcome {
            ReadOutcome::Counted {
                orientation,
                labels,
            } => {
                let joined: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
                writeln!(
                    writer,
                    "{}\tfalse\t{}\t{}",
                    record.read_id,
                    orientation.is_flipped(),
                    joined.join(LABEL_SEPARATOR)
                )?;
            }
            ReadOutcome::Dropped(_) => {
                writeln!(writer, "{}\ttrue\t{MISSING}\t{MISSING}", record.read_id)?;
            }
        }
    }
    writer.flush()
}

/// Write the per-read table to `<dir>/debug_info.tsv`, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn write_read_outcomes_file(dir: &Path, outcomes: &[ReadRecord]) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(DEBUG_TABLE_NAME);
    write_atomically(&path, |writer| write_read_outcomes(writer, outcomes))?;
    Ok(path)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn write_atomically<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let partial = partial_path(path);
    let result = File::create(&partial).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)
    });
    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, path)
}
