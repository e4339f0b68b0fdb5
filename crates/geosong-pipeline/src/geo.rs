//! Coordinates to place name.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use geosong_core::{GeocodeResult, ReverseGeocoder};

/// Join the long names of the first candidate's address components.
///
/// Returns `None` when there is no candidate or the joined text is blank.
pub fn location_from_results(results: &[GeocodeResult]) -> Option<String> {
    let first = results.first()?;
    let location = first
        .address_components
        .iter()
        .map(|c| c.long_name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if location.is_empty() {
        None
    } else {
        Some(location)
    }
}

/// Resolves coordinates to a human-readable place name.
///
/// Geocoder failures are logged and treated as "no result".
#[derive(Clone)]
pub struct GeoResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }

    #[instrument(skip(self), fields(subsystem = "pipeline", component = "geo_resolver", op = "resolve"))]
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> Option<String> {
        match self.geocoder.reverse_geocode(latitude, longitude).await {
            Ok(results) => {
                let location = location_from_results(&results);
                debug!(resolved = location.is_some(), "Reverse geocode finished");
                location
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, treating as no result");
                None
            }
        }
    }
}
