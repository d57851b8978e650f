//! Running speed to metabolic-equivalent (MET) lookup.

/// Upper speed bounds (km/h, exclusive) paired with their MET value,
/// ordered by increasing speed
const MET_BY_SPEED: &[(f64, f64)] = &[
    (6.4, 6.0),
    (8.0, 8.3),
    (9.7, 9.8),
    (11.3, 11.0),
    (12.9, 11.8),
    (14.5, 12.8),
    (16.1, 14.5),
];

/// MET for anything at or above the last bound
const MET_CEILING: f64 = 16.0;

/// Resolve the MET value for an average running speed in km/h
///
/// The first bound the speed falls below wins; a speed exactly on a bound
/// belongs to the next, faster bracket. No interpolation.
pub fn resolve_met(speed_kmh: f64) -> f64 {
    MET_BY_SPEED
        .iter()
        .find(|(bound, _)| speed_kmh < *bound)
        .map(|(_, met)| *met)
        .unwrap_or(MET_CEILING)
}
