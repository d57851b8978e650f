//! Front-end entry points over the stores and the calculation engine.
//!
//! `Tracker` is what a user interface talks to: it reads settings and
//! records from the storage collaborators, runs the pure calculations and
//! writes back the few things that are persisted (settings, new records).

use crate::calories::estimate_calories;
use crate::config::DataPaths;
use crate::normalize::{date_key, normalize_date, to_number, DateInput};
use crate::record_log::JsonlRecordLog;
use crate::settings::SettingsUpdate;
use crate::settings_store::JsonSettingsStore;
use crate::store::{RecordLog, SettingsStore};
use crate::summary::{compute_daily_summary, compute_monthly_summary};
use crate::{DailySummary, MonthlySummary, Result, RunRecord, Settings};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

/// A submitted run form with raw field values
#[derive(Clone, Debug, PartialEq)]
pub struct RunPayload {
    pub date: DateInput,
    pub distance_km: Value,
    pub duration_min: Value,
    pub weight_kg: Value,
    pub memo: Option<String>,
}

impl Default for RunPayload {
    fn default() -> Self {
        Self {
            date: DateInput::Absent,
            distance_km: Value::Null,
            duration_min: Value::Null,
            weight_kg: Value::Null,
            memo: None,
        }
    }
}

/// Everything a front end shows on open
#[derive(Clone, Debug, Serialize)]
pub struct AppData {
    pub settings: Settings,
    /// Today's date-key
    pub today: String,
    pub today_summary: DailySummary,
    pub monthly_summary: MonthlySummary,
}

/// Result of saving settings
#[derive(Clone, Debug, Serialize)]
pub struct SettingsSaved {
    pub settings: Settings,
    pub monthly_summary: MonthlySummary,
}

/// Result of logging a run
#[derive(Clone, Debug, Serialize)]
pub struct RunSaved {
    /// Rounded calories frozen into the new record
    pub calories: i64,
    pub record: RunRecord,
    /// Summary for the day the run was logged on
    pub summary: DailySummary,
    pub monthly_summary: MonthlySummary,
}

/// Build a record from a submitted run form
///
/// Missing or non-numeric fields count as zero; calories are estimated and
/// rounded here and never recomputed afterwards.
pub fn build_record(payload: RunPayload, tz: Tz, now: DateTime<Utc>) -> RunRecord {
    let date = normalize_date(payload.date, tz, now);
    let distance_km = to_number(&payload.distance_km);
    let duration_min = to_number(&payload.duration_min);
    let weight_kg = to_number(&payload.weight_kg);

    let calories_kcal = estimate_calories(distance_km, duration_min, weight_kg).round();

    RunRecord {
        id: Uuid::new_v4(),
        date: Some(date),
        distance_km,
        duration_min: Some(duration_min).filter(|v| *v > 0.0),
        weight_kg: Some(weight_kg).filter(|v| *v > 0.0),
        calories_kcal,
        memo: payload.memo.unwrap_or_default(),
        recorded_at: now,
    }
}

/// Settings and record stores plus the time zone used for date-keys
pub struct Tracker<S, L> {
    settings: S,
    records: L,
    tz: Tz,
}

/// Tracker over the on-disk stores
pub type FileTracker = Tracker<JsonSettingsStore, JsonlRecordLog>;

impl FileTracker {
    /// Open the file-backed stores under `data_dir`
    pub fn open(data_dir: &Path, tz: Tz) -> Self {
        let paths = DataPaths::under(data_dir);
        Tracker::new(
            JsonSettingsStore::new(paths.settings),
            JsonlRecordLog::new(paths.live_log, paths.archive).with_time_zone(tz),
            tz,
        )
    }
}

impl<S: SettingsStore, L: RecordLog> Tracker<S, L> {
    pub fn new(settings: S, records: L, tz: Tz) -> Self {
        Self {
            settings,
            records,
            tz,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn settings_store(&self) -> &S {
        &self.settings
    }

    pub fn record_log(&self) -> &L {
        &self.records
    }

    /// Make sure every setting key is stored with its resolved value
    ///
    /// Missing, blank or unparseable stored values are replaced by what
    /// they resolve to; keys already holding that value are left alone.
    pub fn init(&mut self) -> Result<Settings> {
        let raw = self.settings.read_raw()?;
        let settings = Settings::resolve(&raw);

        let stale: Vec<(&str, Value)> = settings
            .entries()
            .into_iter()
            .filter(|(key, value)| raw.get(*key) != Some(value))
            .collect();

        if !stale.is_empty() {
            tracing::info!("Writing {} default settings", stale.len());
            self.settings.write_settings(&stale)?;
        }

        Ok(settings)
    }

    pub fn settings(&self) -> Result<Settings> {
        self.settings.read_settings()
    }

    pub fn records(&self) -> Result<Vec<RunRecord>> {
        self.records.list_records()
    }

    pub fn daily_summary(&self, date: &str) -> Result<DailySummary> {
        let records = self.records.list_records()?;
        Ok(compute_daily_summary(&records, date, self.tz))
    }

    pub fn monthly_summary(&self, reference: DateTime<Utc>) -> Result<MonthlySummary> {
        let settings = self.settings.read_settings()?;
        let records = self.records.list_records()?;
        Ok(compute_monthly_summary(&records, &settings, reference, self.tz))
    }

    /// Settings, today's summary and the monthly report
    pub fn app_data(&mut self, now: DateTime<Utc>) -> Result<AppData> {
        let settings = self.init()?;
        let records = self.records.list_records()?;
        let today = date_key(now, self.tz);

        Ok(AppData {
            today_summary: compute_daily_summary(&records, &today, self.tz),
            monthly_summary: compute_monthly_summary(&records, &settings, now, self.tz),
            settings,
            today,
        })
    }

    /// Coerce and store a submitted settings form
    pub fn save_settings(
        &mut self,
        update: &SettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<SettingsSaved> {
        self.init()?;

        let normalized = update.normalize();
        self.settings.write_settings(&normalized.entries())?;
        tracing::info!(
            "Saved settings: gender={}, age={}, goal={} kg",
            normalized.gender,
            normalized.age,
            normalized.monthly_goal_kg
        );

        let settings = self.settings.read_settings()?;
        let monthly_summary = self.monthly_summary(now)?;
        Ok(SettingsSaved {
            settings,
            monthly_summary,
        })
    }

    /// Estimate, persist and summarise a submitted run
    pub fn save_run_record(&mut self, payload: RunPayload, now: DateTime<Utc>) -> Result<RunSaved> {
        self.init()?;

        let record = build_record(payload, self.tz, now);
        self.records.append_record(&record)?;

        let calories = record.calories_kcal as i64;
        tracing::info!(
            "Logged {:.2} km run ({} kcal) as {}",
            record.distance_km,
            calories,
            record.id
        );

        let day = record
            .date
            .map(|d| date_key(d, self.tz))
            .unwrap_or_else(|| date_key(now, self.tz));

        let settings = self.settings.read_settings()?;
        let records = self.records.list_records()?;

        Ok(RunSaved {
            calories,
            summary: compute_daily_summary(&records, &day, self.tz),
            monthly_summary: compute_monthly_summary(&records, &settings, now, self.tz),
            record,
        })
    }
}
