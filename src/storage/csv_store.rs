//! CSV history backend
//!
//! The history file is plain CSV so it stays human-inspectable:
//! `url,category,extraction_date`, one row per accepted asset. The header is
//! written exactly once, when the file is first created.

use crate::state::SeenSet;
use crate::storage::traits::{HistoryStore, StorageError, StorageResult};
use crate::storage::HistoryRecord;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Column names of the history file, in order
pub const HISTORY_HEADER: [&str; 3] = ["url", "category", "extraction_date"];

/// CSV-backed history store
///
/// The file is opened for appending on the first `append` and kept open for
/// the lifetime of the store.
pub struct CsvHistoryStore {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvHistoryStore {
    /// Creates a store for the given path; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the history file exists and holds at least a header
    pub fn exists(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    /// Returns the append writer, opening it on first use
    fn writer(&mut self) -> StorageResult<&mut csv::Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open_writer()?,
        };
        Ok(self.writer.insert(writer))
    }

    /// Opens the file for appending, writing the header if the file is new
    fn open_writer(&self) -> StorageResult<csv::Writer<File>> {
        let is_new = !self.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A row cut off mid-write must not swallow the next record
        if !is_new && !ends_with_newline(&mut file)? {
            tracing::warn!(
                "History file {} ends in a partial row, terminating it",
                self.path.display()
            );
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(HISTORY_HEADER)?;
            writer.flush()?;
            tracing::debug!("Created history file {}", self.path.display());
        }

        Ok(writer)
    }

    fn reader(&self) -> StorageResult<csv::Reader<File>> {
        Ok(csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?)
    }
}

impl HistoryStore for CsvHistoryStore {
    fn load(&self) -> StorageResult<SeenSet> {
        let mut seen = SeenSet::new();
        if !self.exists() {
            return Ok(seen);
        }

        let mut reader = self.reader()?;
        let url_idx = column_index(reader.headers()?, HISTORY_HEADER[0])?;

        for result in reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable history row: {}", e);
                    continue;
                }
            };

            match row.get(url_idx) {
                Some(url) if !url.is_empty() => seen.insert_persisted(url),
                _ => continue,
            }
        }

        Ok(seen)
    }

    fn append(&mut self, record: &HistoryRecord) -> StorageResult<()> {
        let stamp = record.extracted_at_string();
        let writer = self.writer()?;
        writer.write_record([
            record.reference.as_str(),
            record.category.as_str(),
            stamp.as_str(),
        ])?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn records(&self) -> StorageResult<Vec<HistoryRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut reader = self.reader()?;
        let headers = reader.headers()?.clone();
        let url_idx = column_index(&headers, HISTORY_HEADER[0])?;
        let category_idx = column_index(&headers, HISTORY_HEADER[1])?;
        let date_idx = column_index(&headers, HISTORY_HEADER[2])?;

        let mut records = Vec::new();
        for result in reader.records() {
            let Ok(row) = result else {
                continue;
            };

            let (Some(url), Some(category), Some(date)) =
                (row.get(url_idx), row.get(category_idx), row.get(date_idx))
            else {
                continue;
            };
            if url.is_empty() {
                continue;
            }

            match parse_timestamp(date) {
                Some(extracted_at) => records.push(HistoryRecord {
                    reference: url.to_string(),
                    category: category.to_string(),
                    extracted_at,
                }),
                None => tracing::debug!("Skipping history row with bad timestamp '{}'", date),
            }
        }

        Ok(records)
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn column_index(headers: &csv::StringRecord, name: &str) -> StorageResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| StorageError::MissingColumn(name.to_string()))
}

/// Parses an RFC 3339 timestamp, or a zone-less ISO-8601 one taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
