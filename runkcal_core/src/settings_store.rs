//! JSON file settings store with file locking.
//!
//! Settings live in a single JSON object of `{key: scalar}` pairs. Writes
//! go through a locked temp file that is renamed over the original.

use crate::settings::SettingsMap;
use crate::store::SettingsStore;
use crate::{Error, Result};
use fs2::FileExt;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Settings store backed by a JSON file
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored pairs with shared locking
    ///
    /// Returns an empty map if the file doesn't exist.
    /// If the file is unreadable or corrupted, logs a warning and returns an
    /// empty map so every setting resolves to its default.
    pub fn load(&self) -> Result<SettingsMap> {
        if !self.path.exists() {
            tracing::info!("No settings file found, using defaults");
            return Ok(SettingsMap::new());
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open settings file {:?}: {}. Using defaults.",
                    self.path,
                    e
                );
                return Ok(SettingsMap::new());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock settings file {:?}: {}. Using defaults.",
                self.path,
                e
            );
            return Ok(SettingsMap::new());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read settings file {:?}: {}. Using defaults.",
                self.path,
                e
            );
            return Ok(SettingsMap::new());
        }

        file.unlock()?;

        match serde_json::from_str::<SettingsMap>(&contents) {
            Ok(map) => {
                tracing::debug!("Loaded {} settings from {:?}", map.len(), self.path);
                Ok(map)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings file {:?}: {}. Using defaults.",
                    self.path,
                    e
                );
                Ok(SettingsMap::new())
            }
        }
    }

    /// Save stored pairs atomically with exclusive locking
    pub fn save(&self, map: &SettingsMap) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store("settings path missing parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Load, modify and save back in one step
    pub fn update<F>(&self, f: F) -> Result<SettingsMap>
    where
        F: FnOnce(&mut SettingsMap),
    {
        let mut map = self.load()?;
        f(&mut map);
        self.save(&map)?;
        Ok(map)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn read_raw(&self) -> Result<SettingsMap> {
        self.load()
    }

    fn write_setting(&mut self, key: &str, value: Value) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value);
        })?;
        Ok(())
    }

    fn write_settings(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert(key.to_string(), value.clone());
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::keys;
    use crate::{ActivityLevel, Settings};
    use serde_json::json;

    #[test]
    fn test_missing_file_reads_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(temp_dir.path().join("settings.json"));

        assert!(store.read_raw().unwrap().is_empty());
        assert_eq!(store.read_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_write_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let mut store = JsonSettingsStore::new(&path);

        store.write_setting(keys::ACTIVITY_LEVEL, json!("high")).unwrap();
        store.write_setting(keys::DAILY_TARGET_KCAL, json!(1800)).unwrap();
        store.write_setting(keys::DAILY_TARGET_KCAL, json!(1900)).unwrap();

        let reopened = JsonSettingsStore::new(&path);
        let raw = reopened.read_raw().unwrap();
        assert_eq!(raw.len(), 2);

        let settings = reopened.read_settings().unwrap();
        assert_eq!(settings.activity_level, ActivityLevel::High);
        assert_eq!(settings.daily_target_kcal, 1900.0);
    }

    #[test]
    fn test_corrupted_file_reads_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = JsonSettingsStore::new(&path);
        assert_eq!(store.read_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        let mut store = JsonSettingsStore::new(&path);

        store
            .write_settings(&Settings::default().entries())
            .unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "settings.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only settings.json, found extras: {:?}",
            extras
        );
    }
}
