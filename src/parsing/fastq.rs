//! FASTQ read source using noodles.
//!
//! Supports uncompressed and gzip/bgzip compressed files (by `.gz`/`.bgz`
//! suffix), and standard input when the path is `-`.

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fastq;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FASTQ record after read {after}: {source}")]
    Format {
        after: String,
        #[source]
        source: std::io::Error,
    },
}

/// One sequenced read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub sequence: Vec<u8>,
}

impl Read {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Streaming iterator over the reads of a FASTQ source
pub struct ReadSource {
    reader: fastq::io::Reader<Box<dyn BufRead>>,
    record: fastq::Record,
    last_id: Option<String>,
}

impl ReadSource {
    /// Open a FASTQ file (`-` for stdin)
    ///
    /// # Errors
    ///
    /// Returns `ReadError::Io` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let inner: Box<dyn BufRead> = if path == Path::new("-") {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = std::fs::File::open(path)?;
            if is_gzipped(path) {
                Box::new(BufReader::new(MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            }
        };
        Ok(Self::from_reader(inner))
    }

    /// Wrap an already-decompressed FASTQ stream
    pub fn from_reader(inner: Box<dyn BufRead>) -> Self {
        Self {
            reader: fastq::io::Reader::new(inner),
            record: fastq::Record::default(),
            last_id: None,
        }
    }

    /// Read the next record, or `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `ReadError::Format` if a record is malformed.
    pub fn next_read(&mut self) -> Result<Option<Read>, ReadError> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let name: &[u8] = self.record.name().as_ref();
                let read = Read::new(
                    String::from_utf8_lossy(name).into_owned(),
                    self.record.sequence().to_vec(),
                );
                self.last_id = Some(read.id.clone());
                Ok(Some(read))
            }
            Err(source) => Err(ReadError::Format {
                after: self.last_id.clone().unwrap_or_else(|| "<start>".to_string()),
                source,
            }),
        }
    }
}

impl Iterator for ReadSource {
    type Item = Result<Read, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_read().transpose()
    }
}
