//! Environment configuration for the viewer.

use std::path::PathBuf;

use foundation::LatLng;
use runtime::StalePolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "invalid {key}={value:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub category: String,
    pub stale_policy: StalePolicy,
    pub center: LatLng,
    pub zoom: f64,
    pub size: [f64; 2],
    pub sites_path: Option<PathBuf>,
    pub out_path: PathBuf,
    pub overpass_url: Option<String>,
    pub nominatim_url: Option<String>,
    /// Address searched after the initial load.
    pub search: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            category: "cafe".to_string(),
            stale_policy: StalePolicy::default(),
            center: LatLng::new(48.135, 11.58),
            zoom: 15.0,
            size: [1024.0, 768.0],
            sites_path: None,
            out_path: PathBuf::from("voronoi.svg"),
            overpass_url: None,
            nominatim_url: None,
            search: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let env = Env(&lookup);

        let stale_policy = match env.string("VORONOI_STALE_POLICY") {
            Some(raw) => raw.parse::<StalePolicy>().map_err(|reason| ConfigError::Invalid {
                key: "VORONOI_STALE_POLICY",
                value: raw.clone(),
                reason,
            })?,
            None => d.stale_policy,
        };

        let lat = env.f64("VORONOI_CENTER_LAT", d.center.lat)?;
        let lng = env.f64("VORONOI_CENTER_LNG", d.center.lng)?;
        let lat_ok = (-85.0..=85.0).contains(&lat);
        check("VORONOI_CENTER_LAT", lat, lat_ok, "outside Web Mercator range")?;
        let lng_ok = (-180.0..=180.0).contains(&lng);
        check("VORONOI_CENTER_LNG", lng, lng_ok, "outside [-180, 180]")?;

        let zoom = env.f64("VORONOI_ZOOM", d.zoom)?;
        check("VORONOI_ZOOM", zoom, (0.0..=22.0).contains(&zoom), "outside [0, 22]")?;

        let width = env.f64("VORONOI_WIDTH", d.size[0])?;
        let height = env.f64("VORONOI_HEIGHT", d.size[1])?;
        check("VORONOI_WIDTH", width, width >= 1.0, "must be at least 1 pixel")?;
        check("VORONOI_HEIGHT", height, height >= 1.0, "must be at least 1 pixel")?;

        Ok(Self {
            category: env.string("VORONOI_CATEGORY").unwrap_or(d.category),
            stale_policy,
            center: LatLng::new(lat, lng),
            zoom,
            size: [width, height],
            sites_path: env.string("VORONOI_SITES").map(PathBuf::from),
            out_path: env.string("VORONOI_OUT").map(PathBuf::from).unwrap_or(d.out_path),
            overpass_url: env.string("VORONOI_OVERPASS_URL"),
            nominatim_url: env.string("VORONOI_NOMINATIM_URL"),
            search: env.string("VORONOI_SEARCH"),
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Non-empty, trimmed value.
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn f64(&self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let Some(raw) = self.string(key) else {
            return Ok(default);
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Err(invalid(key, raw, "not a finite number")),
            Err(e) => Err(invalid(key, raw, &e.to_string())),
        }
    }
}

fn invalid(key: &'static str, value: String, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.to_string(),
    }
}

fn check(key: &'static str, value: f64, ok: bool, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(invalid(key, value.to_string(), reason))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use runtime::StalePolicy;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ViewerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ViewerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("VORONOI_CATEGORY", " restaurant "),
            ("VORONOI_STALE_POLICY", "last-resolved"),
            ("VORONOI_ZOOM", "12.5"),
            ("VORONOI_WIDTH", "640"),
            ("VORONOI_SITES", "data/sites.json"),
            ("VORONOI_OVERPASS_URL", ""),
        ]))
        .unwrap();
        assert_eq!(cfg.category, "restaurant");
        assert_eq!(cfg.stale_policy, StalePolicy::LastResolvedWins);
        assert_eq!(cfg.zoom, 12.5);
        assert_eq!(cfg.size, [640.0, 768.0]);
        assert_eq!(cfg.sites_path.as_deref(), Some(std::path::Path::new("data/sites.json")));
        assert_eq!(cfg.overpass_url, None);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = ViewerConfig::from_lookup(lookup(&[("VORONOI_ZOOM", "far")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VORONOI_ZOOM", .. }));

        let err = ViewerConfig::from_lookup(lookup(&[("VORONOI_CENTER_LAT", "89")])).unwrap_err();
        assert!(err.to_string().contains("VORONOI_CENTER_LAT"));

        let err =
            ViewerConfig::from_lookup(lookup(&[("VORONOI_STALE_POLICY", "newest")])).unwrap_err();
        assert!(err.to_string().contains("unknown stale policy"));
    }
}
