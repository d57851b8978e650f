//! Basal metabolic rate estimate by gender and age bracket.
//!
//! These are coarse population averages, not a per-person equation. The two
//! gender tables are independent calibration data.

use crate::Gender;

/// One age bracket: inclusive bounds in years and the daily kcal figure
struct BmrBracket {
    min_age: f64,
    max_age: f64,
    kcal: f64,
}

const fn bracket(min_age: f64, max_age: f64, kcal: f64) -> BmrBracket {
    BmrBracket {
        min_age,
        max_age,
        kcal,
    }
}

const MALE_BRACKETS: &[BmrBracket] = &[
    bracket(0.0, 17.0, 1350.0),
    bracket(18.0, 29.0, 1530.0),
    bracket(30.0, 49.0, 1500.0),
    bracket(50.0, 69.0, 1400.0),
    bracket(70.0, 120.0, 1280.0),
];

const FEMALE_BRACKETS: &[BmrBracket] = &[
    bracket(0.0, 17.0, 1250.0),
    bracket(18.0, 29.0, 1210.0),
    bracket(30.0, 49.0, 1170.0),
    bracket(50.0, 69.0, 1110.0),
    bracket(70.0, 120.0, 1010.0),
];

/// Estimate daily BMR in kcal
///
/// Returns `0.0` ("cannot estimate") when the gender is unknown or the age
/// is zero, negative or not a number. A positive age that matches no
/// bracket (past 120, or a fraction between two brackets' integer bounds)
/// uses the last bracket.
pub fn estimate_bmr(gender: Gender, age: f64) -> f64 {
    let table = match gender {
        Gender::Male => MALE_BRACKETS,
        Gender::Female => FEMALE_BRACKETS,
        Gender::Unknown => return 0.0,
    };

    if age.is_nan() || age <= 0.0 {
        return 0.0;
    }

    table
        .iter()
        .find(|b| age >= b.min_age && age <= b.max_age)
        .or_else(|| table.last())
        .map(|b| b.kcal)
        .unwrap_or(0.0)
}
