//! User preferences, stored as one JSON value per setting name

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{SETTINGS_BUCKET, SETTING_CHECK_UPDATES, SETTING_THEME};
use crate::highlight::DEFAULT_THEME;
use crate::storage::{Database, StorageResult};

/// A full settings snapshot. Components receive replacements over the bus
/// instead of sharing one mutable copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings(BTreeMap<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn theme(&self) -> &str {
        self.get(SETTING_THEME)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_THEME)
    }

    pub fn check_updates(&self) -> bool {
        self.get(SETTING_CHECK_UPDATES)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Snapshot holding exactly the two known preferences
    pub fn snapshot(theme: &str, check_updates: bool) -> Self {
        let mut settings = Settings::new();
        settings.set(SETTING_THEME, theme);
        settings.set(SETTING_CHECK_UPDATES, check_updates);
        settings
    }
}

pub struct SettingsStore {
    db: Database,
}

impl SettingsStore {
    pub fn new(db: Database) -> Self {
        SettingsStore { db }
    }

    pub fn list_all(&self) -> StorageResult<Settings> {
        let mut settings = Settings::new();
        for (key, value) in self.db.read_all(SETTINGS_BUCKET)? {
            settings.set(key, serde_json::from_slice::<Value>(&value)?);
        }
        Ok(settings)
    }

    pub fn get(&self, key: &str) -> StorageResult<Value> {
        let value = self.db.read(SETTINGS_BUCKET, key)?;
        Ok(serde_json::from_slice(&value)?)
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_vec(value)?;
        self.db.put(SETTINGS_BUCKET, key, &value)
    }

    pub fn delete(&self, key: &str) -> StorageResult<()> {
        self.db.remove(SETTINGS_BUCKET, &[key.to_string()])?;
        Ok(())
    }

    /// Persist every key of a replacement snapshot
    pub fn apply(&self, settings: &Settings) -> StorageResult<()> {
        for (key, value) in settings.iter() {
            self.write(key, value)?;
        }
        Ok(())
    }
}
