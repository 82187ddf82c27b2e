//! # Geocode Module
//!
//! Turns GPS coordinates into a place name for folder naming.
//!
//! ## Layers
//! - `cache` - distance-tolerant cache; nearby photos share one lookup
//! - `resolver` - courtesy delay, backoff on throttling, never fails
//! - `nominatim` - the HTTP transport to an OpenStreetMap Nominatim server
//! - `retry` - the delay schedule and attempt ceiling
//!
//! Every layer below the cache answers with a [`PlaceName`], so a failed
//! lookup is a value (`PlaceName::Unknown`) rather than an error.

mod cache;
mod nominatim;
mod resolver;
mod retry;

pub use cache::{GeoCacheEntry, SpatialGeocodeCache, CACHE_RADIUS_KM};
pub use nominatim::{Address, GeocodeConfig, NominatimClient, ReverseGeocoder, ReverseResponse};
pub use resolver::RemotePlaceResolver;
pub use retry::{Pause, RetryPolicy, ThreadPause};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Text shown for coordinates that could not be resolved
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Haversine great-circle distance between two points, in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Outcome of resolving a location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceName {
    /// A city, town, village, municipality or county name
    Known(String),
    /// The lookup failed or the service had no usable name
    Unknown,
}

impl PlaceName {
    /// The name, if one was found
    pub fn known(&self) -> Option<&str> {
        match self {
            PlaceName::Known(name) => Some(name),
            PlaceName::Unknown => None,
        }
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceName::Known(name) => f.write_str(name),
            PlaceName::Unknown => f.write_str(UNKNOWN_LOCATION),
        }
    }
}

/// Resolves coordinates to a place name
///
/// Implementations must not fail: anything that goes wrong is reported as
/// [`PlaceName::Unknown`]. Calls may block for network I/O.
pub trait PlaceResolver: Send + Sync {
    fn resolve(&self, point: GeoPoint) -> PlaceName;
}

/// Resolver that never goes to the network
///
/// Every photo lands in its year folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineResolver;

impl PlaceResolver for OfflineResolver {
    fn resolve(&self, _point: GeoPoint) -> PlaceName {
        PlaceName::Unknown
    }
}
