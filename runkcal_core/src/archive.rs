//! CSV archive of the run record log.
//!
//! `rollup_to_csv` moves everything in the live JSONL log into an
//! append-only CSV file and empties the log, so the live log stays short.

use crate::normalize::{parse_date_text, to_number};
use crate::record_log::{parse_record_lines, read_locked};
use crate::{Error, Result, RunRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use csv::ReaderBuilder;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive
///
/// Numeric and date columns are kept as text so hand-edited archives are
/// read with the same leniency as the live log.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveRow {
    id: String,
    date: String,
    distance_km: String,
    duration_min: String,
    weight_kg: String,
    calories_kcal: String,
    memo: String,
    recorded_at: String,
}

fn format_number(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        value.to_string()
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&RunRecord> for ArchiveRow {
    fn from(record: &RunRecord) -> Self {
        ArchiveRow {
            id: record.id.to_string(),
            date: record.date.map(format_instant).unwrap_or_default(),
            distance_km: format_number(record.distance_km),
            duration_min: record.duration_min.map(format_number).unwrap_or_default(),
            weight_kg: record.weight_kg.map(format_number).unwrap_or_default(),
            calories_kcal: format_number(record.calories_kcal),
            memo: record.memo.clone(),
            recorded_at: format_instant(record.recorded_at),
        }
    }
}

impl ArchiveRow {
    /// Convert back to a record, reading a zoneless `date` as local to `tz`
    fn into_record(self, tz: Tz) -> Result<RunRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::InvalidRecord(format!("bad id {:?}: {}", self.id, e)))?;

        let recorded_at = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|e| {
                Error::InvalidRecord(format!("bad recorded_at {:?}: {}", self.recorded_at, e))
            })?
            .with_timezone(&Utc);

        let positive = |text: String| Some(to_number(&Value::String(text))).filter(|v| *v > 0.0);

        Ok(RunRecord {
            id,
            date: parse_date_text(&self.date, tz),
            distance_km: to_number(&Value::String(self.distance_km)),
            duration_min: positive(self.duration_min),
            weight_kg: positive(self.weight_kg),
            calories_kcal: to_number(&Value::String(self.calories_kcal)),
            memo: self.memo,
            recorded_at,
        })
    }
}

/// Roll up the live log into the CSV archive
///
/// The log stays exclusively locked for the whole rollup, so no append can
/// land between reading it and emptying it. This function:
/// 1. Reads all records from the live log
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Appends the processed lines to `.wal.processed`
/// 5. Truncates the live log in place
/// 6. Returns the number of records processed
pub fn rollup_to_csv(log_path: &Path, csv_path: &Path, tz: Tz) -> Result<usize> {
    if !log_path.exists() {
        return Ok(0);
    }

    let log = OpenOptions::new().read(true).write(true).open(log_path)?;
    log.lock_exclusive()?;
    let result = rollup_locked(&log, log_path, csv_path, tz);
    log.unlock()?;
    result
}

fn rollup_locked(log: &File, log_path: &Path, csv_path: &Path, tz: Tz) -> Result<usize> {
    let contents = read_locked(log)?;
    let records = parse_record_lines(&contents, tz);

    if records.is_empty() {
        tracing::info!("No records in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when starting a fresh archive
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(ArchiveRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} records to CSV", records.len());

    let processed_path = log_path.with_extension("wal.processed");
    let mut processed = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&processed_path)?;
    processed.write_all(contents.as_bytes())?;
    processed.sync_all()?;

    // Truncate rather than rename: appenders blocked on the lock hold this file
    log.set_len(0)?;
    log.sync_all()?;

    tracing::info!("Archived log to {:?}", processed_path);

    Ok(records.len())
}

/// Remove archived `.processed` log files in the given directory
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed log files", count);
    }

    Ok(count)
}

/// Read every record from the CSV archive, in file order
///
/// Rows that fail to parse are skipped with a warning.
pub fn read_archive(path: &Path, tz: Tz) -> Result<Vec<RunRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<ArchiveRow>() {
        match result {
            Ok(row) => match row.into_record(tz) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Failed to parse archive row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize archive row: {}", e),
        }
    }

    Ok(records)
}
