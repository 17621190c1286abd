//! CSV import.
//!
//! # File format
//!
//! The first record is a header naming the columns. It must contain `title`
//! and `year` and may contain `minutes`, `director` and `notes`, in any
//! order and any letter case. Every following record must have one item per
//! header column.
//!
//! # Validation
//!
//! - A bad header (unknown, blank or repeated column, or a missing required
//!   column) rejects the whole file before any row is read.
//! - A row that is not valid UTF-8, has the wrong length, holds invalid
//!   values, or is refused by the store is rejected on its own; the import
//!   carries on. Only I/O failures abort it.
//!
//! # Reject file
//!
//! Rejected rows go to `<stem>_reject.csv` beside the input: the header
//! first, then for each reject a one-item reason row followed by the row's
//! raw bytes. The file is only created if something is rejected.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};
use crate::movie::{DIRECTOR, DURATION, Movie, NOTES, TITLE, YEAR};
use crate::store::MovieStore;

pub const REQUIRED_COLUMNS: [&str; 2] = [TITLE, YEAR];
pub const OPTIONAL_COLUMNS: [&str; 3] = [DURATION, DIRECTOR, NOTES];
pub const WRONG_LENGTH: &str = "Row has too many or too few items.";
pub const NOT_UTF8: &str = "Row is not valid UTF-8.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub source: PathBuf,
    pub accepted: usize,
    pub rejected: usize,
    pub reject_file: Option<PathBuf>,
}

/// Where rejects for `source` are written.
#[must_use]
pub fn reject_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import".to_string());
    source.with_file_name(format!("{stem}_reject.csv"))
}

/// Normalise and check a header record, returning the column names.
pub fn validate_header(header: &StringRecord) -> Result<Vec<String>> {
    let columns: Vec<String> = header.iter().map(|c| c.trim().to_lowercase()).collect();
    for (i, column) in columns.iter().enumerate() {
        if column.is_empty() {
            return Err(ReelError::invalid_header(format!("column {} is blank", i + 1)));
        }
        if !REQUIRED_COLUMNS.contains(&column.as_str())
            && !OPTIONAL_COLUMNS.contains(&column.as_str())
        {
            return Err(ReelError::invalid_header(format!(
                "'{column}' is not a valid column"
            )));
        }
        if columns[..i].contains(column) {
            return Err(ReelError::invalid_header(format!(
                "'{column}' appears more than once"
            )));
        }
    }
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            return Err(ReelError::invalid_header(format!(
                "required column '{required}' is missing"
            )));
        }
    }
    Ok(columns)
}

/// Import the CSV file at `path` into `store`.
pub fn import_movies(path: &Path, store: &mut impl MovieStore) -> Result<ImportReport> {
    let file = File::open(path)?;
    let mut report = import_from(file, store, reject_path(path))?;
    report.source = path.to_path_buf();
    Ok(report)
}

/// Import CSV text from any reader, writing rejects to `reject_file`.
pub fn import_from<R: Read>(
    input: R,
    store: &mut impl MovieStore,
    reject_file: PathBuf,
) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.byte_records();

    let header = match records.next() {
        Some(record) => StringRecord::from_byte_record(record?)
            .map_err(|_| ReelError::invalid_header("the header is not valid UTF-8"))?,
        None => return Err(ReelError::invalid_header("the file is empty")),
    };
    let columns = validate_header(&header)?;
    let mut rejects = RejectWriter::new(reject_file, columns.clone());
    let mut accepted = 0;

    for (index, raw) in records.enumerate() {
        let line = index + 2;
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                tracing::warn!(message = "import.reject", line, reason = %err);
                rejects.reject(&err.to_string(), &ByteRecord::new())?;
                continue;
            }
        };
        if raw.len() != columns.len() {
            tracing::warn!(message = "import.reject", line, reason = WRONG_LENGTH);
            rejects.reject(WRONG_LENGTH, &raw)?;
            continue;
        }
        let record = match StringRecord::from_byte_record(raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(message = "import.reject", line, reason = NOT_UTF8);
                rejects.reject(NOT_UTF8, &err.into_byte_record())?;
                continue;
            }
        };

        let outcome = Movie::from_fields(columns.iter().map(String::as_str).zip(record.iter()))
            .and_then(|movie| store.add_movie(movie));
        match outcome {
            Ok(()) => accepted += 1,
            Err(err) => {
                tracing::warn!(message = "import.reject", line, reason = %err);
                rejects.reject(&err.to_string(), record.as_byte_record())?;
            }
        }
    }

    let rejected = rejects.count;
    let reject_file = rejects.finish()?;
    tracing::info!(message = "import.done", accepted, rejected);
    Ok(ImportReport {
        source: PathBuf::new(),
        accepted,
        rejected,
        reject_file,
    })
}

/// Opens the reject file on the first reject.
struct RejectWriter {
    path: PathBuf,
    header: Vec<String>,
    writer: Option<csv::Writer<File>>,
    count: usize,
}

impl RejectWriter {
    fn new(path: PathBuf, header: Vec<String>) -> Self {
        Self {
            path,
            header,
            writer: None,
            count: 0,
        }
    }

    fn reject(&mut self, reason: &str, record: &ByteRecord) -> Result<()> {
        if self.writer.is_none() {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&self.path)?;
            writer.write_record(&self.header)?;
            self.writer = Some(writer);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_record([reason])?;
            writer.write_byte_record(record)?;
        }
        self.count += 1;
        Ok(())
    }

    fn finish(self) -> Result<Option<PathBuf>> {
        match self.writer {
            Some(mut writer) => {
                writer.flush()?;
                Ok(Some(self.path))
            }
            None => Ok(None),
        }
    }
}
