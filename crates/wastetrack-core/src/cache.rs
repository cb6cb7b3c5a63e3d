//! Shared memo of haversine results, keyed by immutable coordinate pairs.

use dashmap::DashMap;

use crate::geo::{haversine_km, DistanceMetric};
use crate::models::Node;

const DEFAULT_MAX_ENTRIES: usize = 100_000;

type Coordinate = (u64, u64);

/// Concurrent distance memo that can be shared between planning calls.
///
/// Entries are keyed by the bit patterns of both coordinates, ordered so that
/// `(a, b)` and `(b, a)` share one slot. Once `max_entries` is reached new
/// pairs are computed but not stored.
#[derive(Debug)]
pub struct DistanceCache {
    entries: DashMap<(Coordinate, Coordinate), f64>,
    max_entries: usize,
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl DistanceCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Distance between two coordinates, computed once per pair.
    pub fn get_or_compute(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
        let key = pair_key(
            (lat1.to_bits(), lon1.to_bits()),
            (lat2.to_bits(), lon2.to_bits()),
        );
        if let Some(hit) = self.entries.get(&key) {
            return *hit;
        }

        // Always compute in canonical order so the cached value is independent
        // of which direction filled the slot.
        let ((a_lat, a_lon), (b_lat, b_lon)) = key;
        let value = haversine_km(
            f64::from_bits(a_lat),
            f64::from_bits(a_lon),
            f64::from_bits(b_lat),
            f64::from_bits(b_lon),
        );
        if self.entries.len() < self.max_entries {
            self.entries.insert(key, value);
        }
        value
    }
}

impl DistanceMetric for DistanceCache {
    fn distance_km(&self, a: &Node, b: &Node) -> f64 {
        self.get_or_compute(a.latitude, a.longitude, b.latitude, b.longitude)
    }
}

fn pair_key(a: Coordinate, b: Coordinate) -> (Coordinate, Coordinate) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Haversine;
    use std::sync::Arc;

    #[test]
    fn cached_distance_matches_direct_computation() {
        let cache = DistanceCache::default();
        let a = Node::new("a", -33.45, -70.66, 10, 80);
        let b = Node::new("b", -33.40, -70.60, 10, 80);

        let direct = Haversine.distance_km(&a, &b);
        let first = cache.distance_km(&a, &b);
        let reversed = cache.distance_km(&b, &a);

        assert!((first - direct).abs() < 1e-12);
        assert_eq!(first, reversed);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn full_cache_still_answers() {
        let cache = DistanceCache::new(1);
        let first = cache.get_or_compute(0.0, 0.0, 1.0, 0.0);
        let second = cache.get_or_compute(0.0, 0.0, 2.0, 0.0);

        assert!(first > 0.0);
        assert!(second > first);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        let cache = Arc::new(DistanceCache::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let lat = i as f64 * 0.01;
                    cache.get_or_compute(lat, 0.0, lat + 0.5, 0.5)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap() > 0.0);
        }
        assert_eq!(cache.len(), 4);
    }
}
