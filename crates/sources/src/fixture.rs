//! In-memory providers backed by a fixed point list.
//!
//! Used by tests and the demo binary. The JSON form is an array of records:
//!
//! ```json
//! [{ "lat": 48.137, "lng": 11.575, "name": "Marienplatz", "category": "cafe" }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use foundation::{GeoBounds, LatLng, Site};
use futures_util::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::provider::{GeocodeError, GeocodeProvider, PointDataProvider, ProviderError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    /// Records without a category match every query.
    #[serde(default)]
    pub category: Option<String>,
}

impl PoiRecord {
    fn matches(&self, bounds: &GeoBounds, category: &str) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| c.eq_ignore_ascii_case(category));
        category_ok && bounds.contains(LatLng::new(self.lat, self.lng))
    }

    fn to_site(&self) -> Site {
        Site::new(LatLng::new(self.lat, self.lng), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FixtureError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::Io(msg) => write!(f, "fixture read failed: {msg}"),
            FixtureError::Parse(msg) => write!(f, "fixture parse failed: {msg}"),
        }
    }
}

impl std::error::Error for FixtureError {}

/// Answers queries by filtering a fixed record list by bounds and category.
#[derive(Debug, Default, Clone)]
pub struct StaticPointProvider {
    records: Vec<PoiRecord>,
}

impl StaticPointProvider {
    pub fn new(records: Vec<PoiRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let records = serde_json::from_str::<Vec<PoiRecord>>(json)
            .map_err(|e| FixtureError::Parse(e.to_string()))?;
        Ok(Self::new(records))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FixtureError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn records(&self) -> &[PoiRecord] {
        &self.records
    }

    /// Synchronous form of [`PointDataProvider::query`].
    pub fn lookup(&self, bounds: &GeoBounds, category: &str) -> Result<Vec<Site>, ProviderError> {
        let sites: Vec<Site> = self
            .records
            .iter()
            .filter(|r| r.matches(bounds, category))
            .map(PoiRecord::to_site)
            .collect();
        if sites.is_empty() {
            Err(ProviderError::Empty)
        } else {
            Ok(sites)
        }
    }
}

impl PointDataProvider for StaticPointProvider {
    fn query<'a>(
        &'a self,
        bounds: GeoBounds,
        category: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<Site>, ProviderError>> {
        Box::pin(future::ready(self.lookup(&bounds, category)))
    }
}

/// Resolves addresses from a fixed table (case-insensitive, trimmed).
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    entries: BTreeMap<String, LatLng>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, address: &str, at: LatLng) -> Self {
        self.entries.insert(normalize(address), at);
        self
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

impl GeocodeProvider for StaticGeocoder {
    fn resolve<'a>(&'a self, address: &'a str) -> LocalBoxFuture<'a, Result<LatLng, GeocodeError>> {
        let found = self
            .entries
            .get(&normalize(address))
            .copied()
            .ok_or(GeocodeError::NotFound);
        Box::pin(future::ready(found))
    }
}

#[cfg(test)]
mod tests {
    use super::{FixtureError, StaticGeocoder, StaticPointProvider};
    use crate::provider::{GeocodeError, GeocodeProvider, PointDataProvider, ProviderError};
    use foundation::{GeoBounds, LatLng};

    const FIXTURE: &str = r#"[
        {"lat": 48.1372, "lng": 11.5755, "name": "Marienplatz", "category": "cafe"},
        {"lat": 48.1390, "lng": 11.5880, "name": "Hofgarten", "category": "park"},
        {"lat": 48.1335, "lng": 11.5840, "name": "Isartor"},
        {"lat": 52.5200, "lng": 13.4050, "name": "Berlin", "category": "cafe"}
    ]"#;

    fn munich() -> GeoBounds {
        GeoBounds::new(LatLng::new(48.130, 11.570), LatLng::new(48.140, 11.590))
    }

    #[tokio::test]
    async fn filters_by_bounds_and_category() {
        let provider = StaticPointProvider::from_json(FIXTURE).unwrap();
        let sites = provider.query(munich(), "cafe").await.unwrap();
        let labels: Vec<_> = sites.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Marienplatz", "Isartor"]);
    }

    #[test]
    fn keeps_every_record_in_file_order() {
        let provider = StaticPointProvider::from_json(FIXTURE).unwrap();
        let names: Vec<_> = provider.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Marienplatz", "Hofgarten", "Isartor", "Berlin"]);
    }

    #[tokio::test]
    async fn no_match_is_empty_error() {
        let provider = StaticPointProvider::from_json(FIXTURE).unwrap();
        let far = GeoBounds::new(LatLng::new(-1.0, -1.0), LatLng::new(1.0, 1.0));
        assert_eq!(provider.query(far, "cafe").await, Err(ProviderError::Empty));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = StaticPointProvider::from_json("[{\"lat\": 1}]").unwrap_err();
        assert!(matches!(err, FixtureError::Parse(_)));
    }

    #[tokio::test]
    async fn geocoder_normalizes_addresses() {
        let marienplatz = LatLng::new(48.137, 11.575);
        let geo = StaticGeocoder::new().with_entry("Marienplatz, München", marienplatz);
        assert_eq!(
            geo.resolve("  marienplatz, münchen ").await,
            Ok(LatLng::new(48.137, 11.575))
        );
        assert_eq!(geo.resolve("Atlantis").await, Err(GeocodeError::NotFound));
    }
}
