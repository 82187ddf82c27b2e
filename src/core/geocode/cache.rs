//! Distance-tolerant geocoding cache.

use super::{GeoPoint, PlaceName, PlaceResolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Queries closer than this to a cached point reuse its place name
pub const CACHE_RADIUS_KM: f64 = 10.0;

/// A resolved point; never changed or evicted once stored
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCacheEntry {
    pub point: GeoPoint,
    pub place: PlaceName,
}

/// Caches place names by proximity in front of a [`PlaceResolver`]
///
/// A lookup scans the entries in insertion order and returns the first one
/// strictly within [`CACHE_RADIUS_KM`]. On a miss the resolver is called
/// with no lock held and the answer is appended under the queried point.
///
/// Two workers missing on nearby points at the same time may both call the
/// resolver and both append an entry. That costs a redundant lookup, never
/// a wrong answer, so it is left alone.
pub struct SpatialGeocodeCache {
    entries: RwLock<Vec<GeoCacheEntry>>,
    resolver: Box<dyn PlaceResolver>,
    radius_km: f64,
    hits: AtomicUsize,
    lookups: AtomicUsize,
}

impl SpatialGeocodeCache {
    pub fn new(resolver: Box<dyn PlaceResolver>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            resolver,
            radius_km: CACHE_RADIUS_KM,
            hits: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Place name for `point`, from the cache or the resolver
    pub fn resolve(&self, point: GeoPoint) -> PlaceName {
        if let Some(place) = self.find(point) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Geocode cache hit for ({:.6}, {:.6}): {}",
                point.latitude, point.longitude, place
            );
            return place;
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let place = self.resolver.resolve(point);

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GeoCacheEntry {
                point,
                place: place.clone(),
            });

        place
    }

    fn find(&self, point: GeoPoint) -> Option<PlaceName> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|entry| entry.point.distance_km(&point) < self.radius_km)
            .map(|entry| entry.place.clone())
    }

    /// Queries answered from the cache
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Queries passed through to the resolver
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Snapshot of the stored entries, in insertion order
    pub fn entries(&self) -> Vec<GeoCacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
