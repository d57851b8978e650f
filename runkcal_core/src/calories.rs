//! Calorie estimate for a single running session.

use crate::met::resolve_met;

/// Energy cost per kg of body weight per km when pace is unknown
pub const FALLBACK_KCAL_PER_KG_KM: f64 = 1.036;

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Average speed in km/h, if both inputs allow it
pub fn average_speed_kmh(distance_km: f64, duration_min: f64) -> Option<f64> {
    if is_positive(distance_km) && is_positive(duration_min) {
        Some(distance_km / (duration_min / 60.0))
    } else {
        None
    }
}

/// Estimate kcal burned by one run
///
/// - no positive distance or weight: `0.0`, meaning "insufficient input"
/// - positive duration: MET for the average speed × weight × hours
/// - otherwise: the fixed-pace approximation `1.036 × weight × distance`
///
/// The result is unrounded; callers round before persisting.
pub fn estimate_calories(distance_km: f64, duration_min: f64, weight_kg: f64) -> f64 {
    if !is_positive(distance_km) || !is_positive(weight_kg) {
        return 0.0;
    }

    match average_speed_kmh(distance_km, duration_min) {
        Some(speed) => {
            let hours = duration_min / 60.0;
            let met = resolve_met(speed);
            tracing::trace!("speed {:.2} km/h -> MET {}", speed, met);
            met * weight_kg * hours
        }
        None => FALLBACK_KCAL_PER_KG_KM * weight_kg * distance_km,
    }
}
