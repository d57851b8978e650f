//! Settings resolution between stored key-value pairs and `Settings`.
//!
//! Settings are persisted as flat `{key: scalar}` pairs. Reading merges them
//! with defaults; saving a submitted form coerces every field first.

use crate::normalize::{
    coalesce_number, normalize_activity_level, normalize_gender, to_number, to_text,
};
use crate::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Persisted key names
pub mod keys {
    pub const DEFAULT_WEIGHT_KG: &str = "default_weight_kg";
    pub const DAILY_TARGET_KCAL: &str = "daily_target_kcal";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const MONTHLY_GOAL_KG: &str = "monthly_goal_kg";
    pub const ACTIVITY_LEVEL: &str = "activity_level";

    pub const ALL: [&str; 6] = [
        DEFAULT_WEIGHT_KG,
        DAILY_TARGET_KCAL,
        GENDER,
        AGE,
        MONTHLY_GOAL_KG,
        ACTIVITY_LEVEL,
    ];
}

/// Raw stored settings, keyed by persisted name
pub type SettingsMap = BTreeMap<String, Value>;

impl Settings {
    /// Resolve stored pairs into settings, filling every gap with a default
    ///
    /// Numbers use `coalesce_number`, so a stored `0` survives. A blank
    /// gender takes the default; a non-blank unrecognised one is `Unknown`.
    pub fn resolve(map: &SettingsMap) -> Self {
        let defaults = Settings::default();

        let gender = match map.get(keys::GENDER).map(to_text) {
            Some(text) if !text.trim().is_empty() => normalize_gender(&text),
            _ => defaults.gender,
        };

        let activity_level = match map.get(keys::ACTIVITY_LEVEL).map(to_text) {
            Some(text) if !text.trim().is_empty() => normalize_activity_level(&text),
            _ => defaults.activity_level,
        };

        Settings {
            default_weight_kg: coalesce_number(
                map.get(keys::DEFAULT_WEIGHT_KG),
                defaults.default_weight_kg,
            ),
            daily_target_kcal: coalesce_number(
                map.get(keys::DAILY_TARGET_KCAL),
                defaults.daily_target_kcal,
            ),
            gender,
            age: coalesce_number(map.get(keys::AGE), defaults.age),
            monthly_goal_kg: coalesce_number(
                map.get(keys::MONTHLY_GOAL_KG),
                defaults.monthly_goal_kg,
            ),
            activity_level,
        }
    }

    /// The persisted `(key, value)` pairs for these settings
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            (keys::DEFAULT_WEIGHT_KG, number_value(self.default_weight_kg)),
            (keys::DAILY_TARGET_KCAL, number_value(self.daily_target_kcal)),
            (keys::GENDER, Value::from(self.gender.as_str())),
            (keys::AGE, number_value(self.age)),
            (keys::MONTHLY_GOAL_KG, number_value(self.monthly_goal_kg)),
            (keys::ACTIVITY_LEVEL, Value::from(self.activity_level.as_str())),
        ]
    }
}

/// Store whole numbers as integers so the file stays readable
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// A submitted settings form with raw field values
///
/// Unlike `Settings::resolve`, saving coerces numbers with `to_number`: a
/// blank numeric field is saved as `0`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub default_weight_kg: Value,
    #[serde(default)]
    pub daily_target_kcal: Value,
    #[serde(default)]
    pub gender: Value,
    #[serde(default)]
    pub age: Value,
    #[serde(default)]
    pub monthly_goal_kg: Value,
    #[serde(default)]
    pub activity_level: Value,
}

impl SettingsUpdate {
    /// Coerce every field into a typed `Settings`
    pub fn normalize(&self) -> Settings {
        Settings {
            default_weight_kg: to_number(&self.default_weight_kg),
            daily_target_kcal: to_number(&self.daily_target_kcal),
            gender: normalize_gender(&to_text(&self.gender)),
            age: to_number(&self.age),
            monthly_goal_kg: to_number(&self.monthly_goal_kg),
            activity_level: normalize_activity_level(&to_text(&self.activity_level)),
        }
    }
}

impl From<&Settings> for SettingsUpdate {
    fn from(settings: &Settings) -> Self {
        SettingsUpdate {
            default_weight_kg: number_value(settings.default_weight_kg),
            daily_target_kcal: number_value(settings.daily_target_kcal),
            gender: Value::from(settings.gender.as_str()),
            age: number_value(settings.age),
            monthly_goal_kg: number_value(settings.monthly_goal_kg),
            activity_level: Value::from(settings.activity_level.as_str()),
        }
    }
}
