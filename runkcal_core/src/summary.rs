//! Daily and monthly summaries over the run record list.
//!
//! Both aggregations rescan the whole record list on every call and keep no
//! state between calls. Records are not assumed to be sorted by date.

use crate::bmr::estimate_bmr;
use crate::normalize::date_key;
use crate::{DailySummary, GoalType, MonthlySummary, RunRecord, Settings};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// kcal of energy per kg of body-mass change
pub const KCAL_PER_KG: f64 = 7500.0;

/// Round half away from zero to an integer total
///
/// Out-of-range values saturate at the `i64` bounds and NaN becomes 0.
fn round_total(value: f64) -> i64 {
    value.round() as i64
}

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Total calories and run count for one date-key
///
/// Records without a date are skipped. Empty input yields a zero summary.
pub fn compute_daily_summary(records: &[RunRecord], date: &str, tz: Tz) -> DailySummary {
    let (total, count) = records
        .iter()
        .filter_map(|record| record.date.map(|d| (d, record.calories_kcal)))
        .filter(|(d, _)| date_key(*d, tz) == date)
        .fold((0.0, 0usize), |(total, count), (_, kcal)| {
            (total + kcal, count + 1)
        });

    tracing::debug!("Daily summary for {}: {} runs, {:.1} kcal", date, count, total);

    DailySummary {
        date: date.to_string(),
        total_calories: round_total(total),
        count,
    }
}

/// Sum of run calories for a calendar month in `tz`
pub fn monthly_running_total(records: &[RunRecord], year: i32, month: u32, tz: Tz) -> f64 {
    let mut skipped = 0;
    let total: f64 = records
        .iter()
        .filter_map(|record| {
            if record.date.is_none() {
                skipped += 1;
            }
            record.date.map(|d| (d.with_timezone(&tz), record.calories_kcal))
        })
        .filter(|(d, _)| d.year() == year && d.month() == month)
        .map(|(_, kcal)| kcal)
        .sum();

    if skipped > 0 {
        tracing::debug!("Skipped {} records without a usable date", skipped);
    }
    total
}

/// Month-to-date energy balance and goal progress as of `reference`
///
/// The month and elapsed days are taken from `reference` in `tz`.
pub fn compute_monthly_summary(
    records: &[RunRecord],
    settings: &Settings,
    reference: DateTime<Utc>,
    tz: Tz,
) -> MonthlySummary {
    let local = reference.with_timezone(&tz);
    let (year, month) = (local.year(), local.month());
    let days_in_month = days_in_month(year, month);
    let days_elapsed = local.day().min(days_in_month);
    let days = f64::from(days_elapsed);

    let bmr_per_day = estimate_bmr(settings.gender, settings.age);
    let activity_factor = settings.activity_level.factor();
    let energy_per_day = round_total(bmr_per_day * activity_factor);
    let energy_total = round_total(energy_per_day as f64 * days);
    let bmr_total = round_total(bmr_per_day * days);

    let running_total = round_total(monthly_running_total(records, year, month, tz));
    let total_burn = energy_total.saturating_add(running_total);
    let target_intake_total = round_total(settings.daily_target_kcal * days);
    let deficit = total_burn.saturating_sub(target_intake_total);

    let goal_kg = settings.monthly_goal_kg;
    let goal_type = GoalType::from_goal_kg(goal_kg);
    let target_amount = round_total(goal_kg.abs() * KCAL_PER_KG);
    let progress_amount = running_total.min(target_amount);
    let target_total_burn = match goal_type {
        GoalType::Deficit => target_intake_total.saturating_add(target_amount),
        GoalType::Surplus => target_intake_total.saturating_sub(target_amount).max(0),
        GoalType::Maintain => target_intake_total,
    };
    let remaining = target_amount.saturating_sub(running_total).max(0);

    MonthlySummary {
        month_key: local.format("%Y-%m").to_string(),
        days_in_month,
        days_elapsed,
        activity_level: settings.activity_level,
        activity_factor,
        bmr_per_day: round_total(bmr_per_day),
        bmr_total,
        energy_per_day,
        energy_total,
        running_total,
        total_burn,
        target_total_burn,
        target_intake_total,
        deficit,
        goal_kg,
        goal_type,
        target_amount,
        progress_amount,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityLevel, Gender};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn record(date: Option<DateTime<Utc>>, kcal: f64) -> RunRecord {
        RunRecord {
            id: Uuid::new_v4(),
            date,
            distance_km: 5.0,
            duration_min: Some(30.0),
            weight_kg: Some(60.0),
            calories_kcal: kcal,
            memo: String::new(),
            recorded_at: Utc::now(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_daily_summary_empty() {
        let summary = compute_daily_summary(&[], "2024-01-01", Tz::UTC);
        assert_eq!(summary, DailySummary::empty("2024-01-01"));
    }

    #[test]
    fn test_daily_summary_sums_matching_day() {
        let records = vec![
            record(at(2024, 6, 1, 7), 300.0),
            record(at(2024, 6, 2, 7), 999.0),
            record(None, 500.0),
            record(at(2024, 6, 1, 19), 450.4),
        ];

        let summary = compute_daily_summary(&records, "2024-06-01", Tz::UTC);
        assert_eq!(summary.total_calories, 750);
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_daily_summary_uses_time_zone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        // 20:00 UTC on May 31 is June 1 in Tokyo
        let records = vec![record(at(2024, 5, 31, 20), 400.0)];

        assert_eq!(compute_daily_summary(&records, "2024-06-01", tokyo).count, 1);
        assert_eq!(compute_daily_summary(&records, "2024-06-01", Tz::UTC).count, 0);
    }

    #[test]
    fn test_monthly_running_total_filters_month() {
        let records = vec![
            record(at(2024, 6, 1, 7), 300.0),
            record(at(2024, 5, 31, 7), 200.0),
            record(at(2023, 6, 10, 7), 100.0),
            record(None, 50.0),
            record(at(2024, 6, 30, 23), 250.5),
        ];
        assert_eq!(monthly_running_total(&records, 2024, 6, Tz::UTC), 550.5);
    }

    #[test]
    fn test_monthly_summary_full_report() {
        let settings = Settings {
            default_weight_kg: 60.0,
            daily_target_kcal: 2000.0,
            gender: Gender::Male,
            age: 30.0,
            monthly_goal_kg: -1.0,
            activity_level: ActivityLevel::Medium,
        };
        let records = vec![
            record(at(2024, 6, 3, 7), 400.0),
            record(at(2024, 6, 9, 7), 600.4),
            record(at(2024, 5, 20, 7), 800.0),
        ];
        let reference = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();

        let summary = compute_monthly_summary(&records, &settings, reference, Tz::UTC);

        assert_eq!(summary.month_key, "2024-06");
        assert_eq!(summary.days_in_month, 30);
        assert_eq!(summary.days_elapsed, 10);
        assert_eq!(summary.bmr_per_day, 1500);
        assert_eq!(summary.activity_factor, 1.55);
        assert_eq!(summary.energy_per_day, 2325);
        assert_eq!(summary.energy_total, 23250);
        assert_eq!(summary.bmr_total, 15000);
        assert_eq!(summary.running_total, 1000);
        assert_eq!(summary.total_burn, 24250);
        assert_eq!(summary.target_intake_total, 20000);
        assert_eq!(summary.deficit, 4250);
        assert_eq!(summary.goal_type, GoalType::Deficit);
        assert_eq!(summary.target_amount, 7500);
        assert_eq!(summary.progress_amount, 1000);
        assert_eq!(summary.target_total_burn, 27500);
        assert_eq!(summary.remaining, 6500);
    }

    #[test]
    fn test_monthly_goal_sign_targets() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut settings = Settings {
            monthly_goal_kg: -2.0,
            ..Settings::default()
        };

        let deficit = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(
            deficit.target_total_burn,
            deficit.target_intake_total + 15000
        );

        settings.monthly_goal_kg = 2.0;
        let surplus = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(surplus.goal_type, GoalType::Surplus);
        assert_eq!(
            surplus.target_total_burn,
            (surplus.target_intake_total - 15000).max(0)
        );
        assert_eq!(surplus.target_total_burn, 5000);

        settings.monthly_goal_kg = 0.0;
        let maintain = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(maintain.goal_type, GoalType::Maintain);
        assert_eq!(maintain.target_amount, 0);
        assert_eq!(maintain.target_total_burn, maintain.target_intake_total);
        assert_eq!(maintain.remaining, 0);
    }

    #[test]
    fn test_surplus_target_clamps_at_zero() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let settings = Settings {
            monthly_goal_kg: 3.0,
            ..Settings::default()
        };

        let summary = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(summary.target_intake_total, 2000);
        assert_eq!(summary.target_total_burn, 0);
    }

    #[test]
    fn test_remaining_clamps_when_goal_exceeded() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
        let settings = Settings {
            monthly_goal_kg: -0.1,
            ..Settings::default()
        };
        let records = vec![record(at(2024, 6, 5, 7), 900.0)];

        let summary = compute_monthly_summary(&records, &settings, reference, Tz::UTC);
        assert_eq!(summary.target_amount, 750);
        assert_eq!(summary.progress_amount, 750);
        assert_eq!(summary.remaining, 0);
    }

    #[test]
    fn test_unknown_gender_gives_zero_bmr() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let settings = Settings {
            gender: Gender::Unknown,
            ..Settings::default()
        };

        let summary = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(summary.bmr_per_day, 0);
        assert_eq!(summary.energy_total, 0);
        assert_eq!(summary.total_burn, 0);
        assert_eq!(summary.deficit, -20000);
    }

    #[test]
    fn test_monthly_summary_is_idempotent() {
        let reference = Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap();
        let settings = Settings::default();
        let records = vec![record(at(2024, 2, 14, 7), 321.0)];

        let first = compute_monthly_summary(&records, &settings, reference, Tz::UTC);
        let second = compute_monthly_summary(&records, &settings, reference, Tz::UTC);
        assert_eq!(first, second);
        assert_eq!(first.days_in_month, 29);
        assert_eq!(first.days_elapsed, 29);
    }

    #[test]
    fn test_huge_goal_saturates() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let settings = Settings {
            monthly_goal_kg: -1e300,
            ..Settings::default()
        };

        let summary = compute_monthly_summary(&[], &settings, reference, Tz::UTC);
        assert_eq!(summary.goal_type, GoalType::Deficit);
        assert_eq!(summary.target_amount, i64::MAX);
        assert_eq!(summary.target_total_burn, i64::MAX);
        assert_eq!(summary.remaining, i64::MAX);
        assert_eq!(summary.progress_amount, 0);

        let surplus = compute_monthly_summary(
            &[],
            &Settings {
                monthly_goal_kg: 1e300,
                ..Settings::default()
            },
            reference,
            Tz::UTC,
        );
        assert_eq!(surplus.target_total_burn, 0);
    }

    #[test]
    fn test_huge_daily_target_saturates() {
        let reference = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let settings = Settings {
            daily_target_kcal: 1e30,
            monthly_goal_kg: -2.0,
            ..Settings::default()
        };
        let records = vec![record(at(2024, 6, 3, 7), 400.0)];

        let summary = compute_monthly_summary(&records, &settings, reference, Tz::UTC);
        assert_eq!(summary.target_intake_total, i64::MAX);
        assert_eq!(summary.target_total_burn, i64::MAX);
        assert_eq!(summary.deficit, 23650 - i64::MAX);
        assert_eq!(summary.running_total, 400);

        let negative = Settings {
            daily_target_kcal: -1e30,
            ..settings
        };
        let summary = compute_monthly_summary(&records, &negative, reference, Tz::UTC);
        assert_eq!(summary.target_intake_total, i64::MIN);
        assert_eq!(summary.deficit, i64::MAX);
    }

    proptest! {
        #[test]
        fn prop_remaining_never_negative(
            calories in prop::collection::vec(0.0f64..2000.0, 0..20),
            goal_kg in -5.0f64..5.0,
            day in 1u32..=28,
        ) {
            let records: Vec<_> = calories
                .iter()
                .map(|kcal| record(at(2024, 3, day, 6), *kcal))
                .collect();
            let settings = Settings { monthly_goal_kg: goal_kg, ..Settings::default() };
            let reference = Utc.with_ymd_and_hms(2024, 3, 28, 12, 0, 0).unwrap();

            let summary = compute_monthly_summary(&records, &settings, reference, Tz::UTC);
            prop_assert!(summary.remaining >= 0);
            prop_assert_eq!(
                summary.remaining,
                (summary.target_amount - summary.running_total).max(0)
            );
            prop_assert!(summary.progress_amount <= summary.target_amount);
        }
    }
}
