//! Random container layouts for simulation runs.

use rand::Rng;
use wastetrack_core::{ContainerRecord, EARTH_RADIUS_KM};

/// Destination point after travelling `distance_km` along `bearing_rad` (0 = North).
pub fn offset_by_bearing(lat: f64, lon: f64, distance_km: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_km.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat2 = lat1.sin() * angular_distance.cos()
        + lat1.cos() * angular_distance.sin() * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * angular_distance.sin() * lat1.cos();
    let x = angular_distance.cos() - lat1.sin() * sin_lat2;
    let lon2 = (lon1 + y.atan2(x) + std::f64::consts::PI)
        .rem_euclid(2.0 * std::f64::consts::PI)
        - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Scatter `count` containers uniformly over a disc around the centre.
///
/// Ids are `CNT0001`, `CNT0002`, ... Fill levels span 0..=100 and limits
/// 70..=95, so a typical run mixes urgent and normal stops.
pub fn random_containers<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    center: (f64, f64),
    radius_km: f64,
) -> Vec<ContainerRecord> {
    let (center_lat, center_lon) = center;
    (1..=count)
        .map(|i| {
            // sqrt keeps the density uniform over the disc area
            let distance_km = radius_km.max(0.0) * rng.random::<f64>().sqrt();
            let bearing = rng.random_range(0.0..std::f64::consts::TAU);
            let (lat, lon) = offset_by_bearing(center_lat, center_lon, distance_km, bearing);

            ContainerRecord::new(
                format!("CNT{i:04}"),
                lat,
                lon,
                rng.random_range(0..=100),
                rng.random_range(70..=95),
            )
        })
        .collect()
}
