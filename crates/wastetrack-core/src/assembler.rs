//! Final presentation of an accepted route.

use crate::models::{Leg, Route, RouteSummary};

/// Flat travel-time assumption used when no other speed is configured.
pub const DEFAULT_MINUTES_PER_KM: f64 = 2.0;

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimate duration and round distances for presentation.
///
/// The duration is derived from the full-precision total; only the returned
/// figures are rounded.
pub fn assemble(route: &Route, minutes_per_km: f64) -> RouteSummary {
    let total_distance_km = route.total_distance_km();
    let estimated_duration_min = total_distance_km * minutes_per_km;

    RouteSummary {
        route: route.stops().to_vec(),
        distances: route
            .legs()
            .iter()
            .map(|leg| Leg::new(leg.from_id.clone(), leg.to_id.clone(), round2(leg.distance_km)))
            .collect(),
        total_distance_km: round2(total_distance_km),
        estimated_duration_min: round2(estimated_duration_min),
    }
}
