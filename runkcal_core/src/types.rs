//! Core domain types for the runkcal system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Demographic and lifestyle enums (gender, activity level, goal type)
//! - Resolved user settings
//! - Persisted run records
//! - Derived daily and monthly summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Gender used for the basal metabolic rate lookup
///
/// `Unknown` means "cannot estimate" and yields a BMR of zero.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifestyle activity level scaling BMR to total daily energy expenditure
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ActivityLevel {
    /// Multiplier applied to BMR for this level
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Medium => 1.55,
            ActivityLevel::High => 1.75,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the monthly body-mass goal, derived from its sign
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Negative goal: lose weight
    Deficit,
    /// Positive goal: gain weight
    Surplus,
    /// Zero goal
    Maintain,
}

impl GoalType {
    pub fn from_goal_kg(goal_kg: f64) -> Self {
        if goal_kg < 0.0 {
            GoalType::Deficit
        } else if goal_kg > 0.0 {
            GoalType::Surplus
        } else {
            GoalType::Maintain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Deficit => "deficit",
            GoalType::Surplus => "surplus",
            GoalType::Maintain => "maintain",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Fully resolved user settings
///
/// Every field always carries a defined value; see `Settings::resolve` for
/// how stored key-value pairs map onto it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub default_weight_kg: f64,
    pub daily_target_kcal: f64,
    pub gender: Gender,
    pub age: f64,
    /// Signed: negative = lose, positive = gain, zero = maintain
    pub monthly_goal_kg: f64,
    pub activity_level: ActivityLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_weight_kg: 60.0,
            daily_target_kcal: 2000.0,
            gender: Gender::Male,
            age: 30.0,
            monthly_goal_kg: -1.0,
            activity_level: ActivityLevel::Medium,
        }
    }
}

// ============================================================================
// Run Records
// ============================================================================

/// A logged running session
///
/// `calories_kcal` is computed once when the record is created and never
/// recomputed. Stored values are read leniently: an unparseable `date`
/// becomes `None` and a malformed calorie value reads as zero.
///
/// Plain serde reads a zoneless `date` as UTC. The record log and archive
/// re-read that field in the configured time zone.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub id: Uuid,
    #[serde(default, deserialize_with = "crate::normalize::lenient_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::normalize::lenient_number")]
    pub distance_km: f64,
    #[serde(default, deserialize_with = "crate::normalize::lenient_positive")]
    pub duration_min: Option<f64>,
    #[serde(default, deserialize_with = "crate::normalize::lenient_positive")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "crate::normalize::lenient_number")]
    pub calories_kcal: f64,
    #[serde(default)]
    pub memo: String,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// Summaries
// ============================================================================

/// Calories burned by running on a single calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummary {
    /// Date-key (`YYYY-MM-DD`)
    pub date: String,
    pub total_calories: i64,
    pub count: usize,
}

impl DailySummary {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            total_calories: 0,
            count: 0,
        }
    }
}

/// Month-to-date energy balance and goal progress
///
/// A point-in-time snapshot; every field is recomputed from settings and the
/// full record list on each request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month_key: String,
    pub days_in_month: u32,
    pub days_elapsed: u32,
    pub activity_level: ActivityLevel,
    pub activity_factor: f64,
    pub bmr_per_day: i64,
    pub bmr_total: i64,
    pub energy_per_day: i64,
    pub energy_total: i64,
    pub running_total: i64,
    pub total_burn: i64,
    pub target_total_burn: i64,
    pub target_intake_total: i64,
    /// Total burn minus target intake; negative when intake exceeds burn
    pub deficit: i64,
    pub goal_kg: f64,
    pub goal_type: GoalType,
    pub target_amount: i64,
    pub progress_amount: i64,
    pub remaining: i64,
}
