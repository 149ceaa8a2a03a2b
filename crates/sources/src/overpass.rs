//! Overpass API point provider.
//!
//! Queries OpenStreetMap nodes tagged `amenity=<category>` inside the viewport.

use foundation::{GeoBounds, LatLng, Site};
use futures_util::future::LocalBoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::provider::{PointDataProvider, ProviderError};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: std::collections::BTreeMap<String, String>,
}

/// Builds the Overpass QL query for one viewport.
///
/// The bounding box order is south, west, north, east. A box crossing the
/// antimeridian is split into two unions.
pub fn overpass_query(bounds: &GeoBounds, category: &str) -> String {
    let key = category.replace('"', "");
    let (s, n) = (bounds.south(), bounds.north());
    let boxes = if bounds.crosses_antimeridian() {
        vec![(s, bounds.west(), n, 180.0), (s, -180.0, n, bounds.east())]
    } else {
        vec![(s, bounds.west(), n, bounds.east())]
    };
    let mut q = String::from("[out:json][timeout:25];(");
    for (s, w, n, e) in boxes {
        q.push_str(&format!("node[\"amenity\"=\"{key}\"]({s},{w},{n},{e});"));
    }
    q.push_str(");out body;");
    q
}

/// Decodes an Overpass JSON body into sites.
///
/// Elements without coordinates are skipped. Unnamed elements get the
/// category as label.
pub fn parse_overpass_response(body: &str, category: &str) -> Result<Vec<Site>, ProviderError> {
    let resp: OverpassResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Query(format!("invalid Overpass response: {e}")))?;
    let sites: Vec<Site> = resp
        .elements
        .into_iter()
        .filter_map(|el| {
            let (lat, lon) = (el.lat?, el.lon?);
            let label = el
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| category.to_string());
            Some(Site::new(LatLng::new(lat, lon), label))
        })
        .collect();
    if sites.is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(sites)
}

pub struct OverpassProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl OverpassProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for OverpassProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OVERPASS_URL)
    }
}

impl PointDataProvider for OverpassProvider {
    fn query<'a>(
        &'a self,
        bounds: GeoBounds,
        category: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<Site>, ProviderError>> {
        let query = overpass_query(&bounds, category);
        Box::pin(async move {
            debug!(endpoint = %self.endpoint, category, "overpass query");
            let resp = self
                .client
                .post(&self.endpoint)
                .form(&[("data", query.as_str())])
                .send()
                .await
                .map_err(|e| ProviderError::Query(format!("HTTP request failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(ProviderError::Query(format!("HTTP error: {}", resp.status())));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| ProviderError::Query(format!("failed to read response: {e}")))?;
            parse_overpass_response(&body, category)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_OVERPASS_URL, OverpassProvider, overpass_query, parse_overpass_response,
    };
    use crate::provider::ProviderError;
    use foundation::{GeoBounds, LatLng};
    use pretty_assertions::assert_eq;

    #[test]
    fn query_uses_south_west_north_east() {
        let b = GeoBounds::new(LatLng::new(48.13, 11.57), LatLng::new(48.14, 11.59));
        assert_eq!(
            overpass_query(&b, "cafe"),
            "[out:json][timeout:25];(node[\"amenity\"=\"cafe\"](48.13,11.57,48.14,11.59);\
             );out body;"
        );
    }

    #[test]
    fn antimeridian_box_is_split() {
        let b = GeoBounds::new(LatLng::new(-10.0, 170.0), LatLng::new(10.0, -170.0));
        let q = overpass_query(&b, "bar");
        assert!(q.contains("(-10,170,10,180)"));
        assert!(q.contains("(-10,-180,10,-170)"));
    }

    #[test]
    fn default_provider_targets_public_endpoint() {
        assert_eq!(OverpassProvider::default().endpoint(), DEFAULT_OVERPASS_URL);
        let mirror = OverpassProvider::new("http://localhost:12345/api/interpreter");
        assert_eq!(mirror.endpoint(), "http://localhost:12345/api/interpreter");
    }

    #[test]
    fn parses_named_and_unnamed_nodes() {
        let body = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 48.137, "lon": 11.575,
             "tags": {"name": "Café Frischhut"}},
            {"type": "node", "id": 2, "lat": 48.135, "lon": 11.580},
            {"type": "way", "id": 3}
        ]}"#;
        let sites = parse_overpass_response(body, "cafe").unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].label, "Café Frischhut");
        assert_eq!(sites[1].label, "cafe");
        assert_eq!(sites[0].position, LatLng::new(48.137, 11.575));
    }

    #[test]
    fn empty_elements_is_empty_error() {
        assert_eq!(
            parse_overpass_response(r#"{"elements": []}"#, "cafe"),
            Err(ProviderError::Empty)
        );
    }

    #[test]
    fn garbage_is_query_error() {
        assert!(matches!(
            parse_overpass_response("<html>", "cafe"),
            Err(ProviderError::Query(_))
        ));
    }
}
