//! Nominatim geocoder.

use foundation::LatLng;
use futures_util::future::LocalBoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::provider::{GeocodeError, GeocodeProvider};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// First hit of a `/search?format=json` body.
pub fn parse_nominatim_response(body: &str) -> Result<LatLng, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Query(format!("invalid Nominatim response: {e}")))?;
    let place = places.first().ok_or(GeocodeError::NotFound)?;
    let lat = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Query(format!("bad latitude {:?}: {e}", place.lat)))?;
    let lng = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Query(format!("bad longitude {:?}: {e}", place.lon)))?;
    Ok(LatLng::new(lat, lng))
}

pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(
            DEFAULT_NOMINATIM_URL,
            concat!("voronoi-viewer/", env!("CARGO_PKG_VERSION")),
        )
    }
}

impl GeocodeProvider for NominatimGeocoder {
    fn resolve<'a>(&'a self, address: &'a str) -> LocalBoxFuture<'a, Result<LatLng, GeocodeError>> {
        Box::pin(async move {
            let url = format!("{}/search", self.base_url);
            debug!(%url, address, "nominatim lookup");
            let resp = self
                .client
                .get(&url)
                .query(&[("q", address), ("format", "json"), ("limit", "1")])
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .send()
                .await
                .map_err(|e| GeocodeError::Query(format!("HTTP request failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(GeocodeError::Query(format!("HTTP error: {}", resp.status())));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| GeocodeError::Query(format!("failed to read response: {e}")))?;
            parse_nominatim_response(&body)
        })
    }
}
