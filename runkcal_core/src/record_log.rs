//! Append-only run record log.
//!
//! New records are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access. Older records may have been rolled up
//! into a CSV archive; listing merges both in insertion order.

use crate::normalize::parse_stored_date;
use crate::store::RecordLog;
use crate::{Result, RunRecord};
use chrono_tz::Tz;
use fs2::FileExt;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// JSONL record log with a CSV archive behind it
pub struct JsonlRecordLog {
    path: PathBuf,
    archive_path: PathBuf,
    tz: Tz,
}

impl JsonlRecordLog {
    /// Create a record log for the given live log and archive paths
    ///
    /// Zoneless stored dates are read as UTC unless a time zone is set
    /// with [`JsonlRecordLog::with_time_zone`].
    pub fn new(path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_path: archive_path.into(),
            tz: Tz::UTC,
        }
    }

    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl RecordLog for JsonlRecordLog {
    fn append_record(&mut self, record: &RunRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended record {} to log", record.id);
        Ok(())
    }

    /// Archived records first, then the live log, each once
    fn list_records(&self) -> Result<Vec<RunRecord>> {
        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();

        if self.archive_path.exists() {
            for record in crate::archive::read_archive(&self.archive_path, self.tz)? {
                if seen_ids.insert(record.id) {
                    records.push(record);
                }
            }
        }

        let archived = records.len();
        for record in read_records(&self.path, self.tz)? {
            if seen_ids.insert(record.id) {
                records.push(record);
            }
        }

        tracing::debug!(
            "Listed {} records ({} archived, {} live)",
            records.len(),
            archived,
            records.len() - archived
        );
        Ok(records)
    }
}

/// Read all records from a JSONL log file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_records(path: &Path, tz: Tz) -> Result<Vec<RunRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;
    let contents = read_locked(&file);
    file.unlock()?;

    let records = parse_record_lines(&contents?, tz);
    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Read a whole log file the caller already holds a lock on
pub(crate) fn read_locked(file: &File) -> Result<String> {
    let mut contents = String::new();
    let mut handle = file;
    handle.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse JSONL log contents, skipping lines that fail with a warning
pub(crate) fn parse_record_lines(contents: &str, tz: Tz) -> Vec<RunRecord> {
    let mut records = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_record_line(line, tz) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse record at line {}: {}", line_num + 1, e);
            }
        }
    }

    records
}

fn parse_record_line(line: &str, tz: Tz) -> serde_json::Result<RunRecord> {
    let mut raw: Value = serde_json::from_str(line)?;
    let date = raw.get_mut("date").map(Value::take).unwrap_or(Value::Null);

    let mut record: RunRecord = serde_json::from_value(raw)?;
    record.date = parse_stored_date(&date, tz);
    Ok(record)
}
