//! Delimited-text workload loader.

use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Records loaded from a data file, in file order
#[derive(Debug, Clone, Default)]
pub struct Workload {
    /// Trimmed `(key, value)` pairs
    pub records: Vec<(String, String)>,
    /// Non-blank lines that did not split into exactly two fields
    pub skipped: usize,
}

impl Workload {
    /// Load a workload from a file of `key<delimiter>value` lines
    pub fn load<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let workload = Self::from_reader(BufReader::new(file), delimiter)?;
        debug!(
            path = %path.display(),
            records = workload.records.len(),
            skipped = workload.skipped,
            "workload loaded"
        );
        Ok(workload)
    }

    /// Parse a workload from any buffered reader
    ///
    /// Both fields are trimmed. Blank lines are ignored; any other line
    /// without exactly one delimiter is skipped and counted.
    pub fn from_reader<R: BufRead>(reader: R, delimiter: char) -> Result<Self> {
        let mut workload = Self::default();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(delimiter);
            match (fields.next(), fields.next(), fields.next()) {
                (Some(key), Some(value), None) => {
                    workload
                        .records
                        .push((key.trim().to_string(), value.trim().to_string()));
                }
                _ => {
                    warn!(line = number + 1, "skipping malformed record");
                    workload.skipped += 1;
                }
            }
        }

        Ok(workload)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &String> + '_ {
        self.records.iter().map(|(k, _)| k)
    }
}
