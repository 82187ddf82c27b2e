//! Remote place resolution with courtesy delay and throttling backoff.

use super::nominatim::{GeocodeConfig, NominatimClient, ReverseGeocoder};
use super::retry::{Pause, RetryPolicy, ThreadPause};
use super::{GeoPoint, PlaceName, PlaceResolver};
use crate::error::GeocodeError;
use tracing::{debug, warn};

/// Resolves places through a [`ReverseGeocoder`], absorbing every failure
///
/// Before each attempt the resolver waits `policy.delay_for(attempt)`.
/// Only a rate-limit response is retried; any other failure, or a
/// rate limit on the final attempt, resolves to [`PlaceName::Unknown`].
pub struct RemotePlaceResolver {
    geocoder: Box<dyn ReverseGeocoder>,
    policy: RetryPolicy,
    pause: Box<dyn Pause>,
}

impl RemotePlaceResolver {
    pub fn new(
        geocoder: Box<dyn ReverseGeocoder>,
        policy: RetryPolicy,
        pause: Box<dyn Pause>,
    ) -> Self {
        Self {
            geocoder,
            policy,
            pause,
        }
    }

    /// Resolver backed by a Nominatim client that sleeps between attempts
    pub fn nominatim(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = NominatimClient::new(config)?;
        Ok(Self::new(Box::new(client), config.retry, Box::new(ThreadPause)))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl PlaceResolver for RemotePlaceResolver {
    fn resolve(&self, point: GeoPoint) -> PlaceName {
        let mut attempt = 0;

        loop {
            self.pause.pause(self.policy.delay_for(attempt));

            match self.geocoder.reverse(point) {
                Ok(response) => {
                    return match response.place_name() {
                        Some(name) => {
                            debug!(
                                "Resolved ({:.6}, {:.6}) to {}",
                                point.latitude, point.longitude, name
                            );
                            PlaceName::Known(name.to_string())
                        }
                        None => PlaceName::Unknown,
                    };
                }
                Err(e) if e.is_rate_limited() && !self.policy.is_final(attempt) => {
                    warn!(
                        "Geocoding throttled for ({:.6}, {:.6}), retrying (attempt {} of {})",
                        point.latitude,
                        point.longitude,
                        attempt + 2,
                        self.policy.max_attempts
                    );
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Error geocoding ({:.6}, {:.6}): {}",
                        point.latitude, point.longitude, e
                    );
                    return PlaceName::Unknown;
                }
            }
        }
    }
}
