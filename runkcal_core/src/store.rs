//! Storage collaborator interfaces.
//!
//! The engine never touches storage itself. These traits describe what it
//! needs from whoever owns the data: a key-value settings store and an
//! append-only record log.

use crate::settings::SettingsMap;
use crate::{Result, RunRecord, Settings};
use serde_json::Value;

/// Key-value settings persistence with upsert-by-key semantics
pub trait SettingsStore {
    /// All stored pairs, exactly as persisted
    fn read_raw(&self) -> Result<SettingsMap>;

    /// Stored pairs merged with defaults; never has a missing field
    fn read_settings(&self) -> Result<Settings> {
        Ok(Settings::resolve(&self.read_raw()?))
    }

    /// Insert or replace a single key
    fn write_setting(&mut self, key: &str, value: Value) -> Result<()>;

    /// Insert or replace several keys
    fn write_settings(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        for (key, value) in entries {
            self.write_setting(key, value.clone())?;
        }
        Ok(())
    }
}

/// Append-only run record persistence
pub trait RecordLog {
    fn append_record(&mut self, record: &RunRecord) -> Result<()>;

    /// Every record in insertion order
    fn list_records(&self) -> Result<Vec<RunRecord>>;
}

/// In-memory store for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    settings: SettingsMap,
    records: Vec<RunRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<RunRecord>) -> Self {
        Self {
            settings: SettingsMap::new(),
            records,
        }
    }
}

impl SettingsStore for MemoryStore {
    fn read_raw(&self) -> Result<SettingsMap> {
        Ok(self.settings.clone())
    }

    fn write_setting(&mut self, key: &str, value: Value) -> Result<()> {
        self.settings.insert(key.to_string(), value);
        Ok(())
    }
}

impl RecordLog for MemoryStore {
    fn append_record(&mut self, record: &RunRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn list_records(&self) -> Result<Vec<RunRecord>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::keys;
    use crate::Gender;
    use serde_json::json;

    #[test]
    fn test_memory_store_upserts_settings() {
        let mut store = MemoryStore::new();
        store.write_setting(keys::AGE, json!(40)).unwrap();
        store.write_setting(keys::AGE, json!(41)).unwrap();
        store.write_setting(keys::GENDER, json!("female")).unwrap();

        let raw = store.read_raw().unwrap();
        assert_eq!(raw.len(), 2);

        let settings = store.read_settings().unwrap();
        assert_eq!(settings.age, 41.0);
        assert_eq!(settings.gender, Gender::Female);
        assert_eq!(settings.daily_target_kcal, 2000.0);
    }

    #[test]
    fn test_write_settings_writes_every_entry() {
        let mut store = MemoryStore::new();
        let entries = Settings::default().entries();
        store.write_settings(&entries).unwrap();

        assert_eq!(store.read_raw().unwrap().len(), keys::ALL.len());
    }
}
