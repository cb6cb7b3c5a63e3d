//! Great-circle distance model.

use crate::error::PlanError;
use crate::models::Node;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two points in kilometres using the haversine formula.
///
/// Coordinates are decimal degrees and are assumed valid; use [`distance`]
/// when the inputs have not been checked.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Reject non-finite or out-of-range coordinates.
pub fn validate_coordinate(id: &str, latitude: f64, longitude: f64) -> Result<(), PlanError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate {
            id: id.to_string(),
            latitude,
            longitude,
        })
    }
}

/// Distance between two nodes in kilometres.
pub fn distance(a: &Node, b: &Node) -> Result<f64, PlanError> {
    validate_coordinate(&a.id, a.latitude, a.longitude)?;
    validate_coordinate(&b.id, b.latitude, b.longitude)?;
    Ok(haversine_km(a.latitude, a.longitude, b.latitude, b.longitude))
}

/// Distance source over nodes that already passed validation.
pub trait DistanceMetric: Send + Sync {
    fn distance_km(&self, a: &Node, b: &Node) -> f64;
}

/// Direct haversine computation with no memoization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceMetric for Haversine {
    fn distance_km(&self, a: &Node, b: &Node) -> f64 {
        haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
    }
}

impl<M: DistanceMetric + ?Sized> DistanceMetric for &M {
    fn distance_km(&self, a: &Node, b: &Node) -> f64 {
        (**self).distance_km(a, b)
    }
}

impl<M: DistanceMetric + ?Sized> DistanceMetric for std::sync::Arc<M> {
    fn distance_km(&self, a: &Node, b: &Node) -> f64 {
        (**self).distance_km(a, b)
    }
}
