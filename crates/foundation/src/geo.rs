/// Geographic coordinate in degrees (WGS84 latitude/longitude).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A point of interest: where it is and what to call it.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub position: LatLng,
    pub label: String,
}

impl Site {
    pub fn new(position: LatLng, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// Geographic rectangle given by its south-west and north-east corners.
///
/// A box whose `ne.lng` is smaller than `sw.lng` crosses the antimeridian.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub sw: LatLng,
    pub ne: LatLng,
}

impl GeoBounds {
    pub fn new(sw: LatLng, ne: LatLng) -> Self {
        Self { sw, ne }
    }

    pub fn north(&self) -> f64 {
        self.ne.lat
    }

    pub fn south(&self) -> f64 {
        self.sw.lat
    }

    pub fn east(&self) -> f64 {
        self.ne.lng
    }

    pub fn west(&self) -> f64 {
        self.sw.lng
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.ne.lng < self.sw.lng
    }

    /// Longitudinal span in degrees, accounting for antimeridian crossing.
    pub fn lng_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.ne.lng + 360.0 - self.sw.lng
        } else {
            self.ne.lng - self.sw.lng
        }
    }

    pub fn center(&self) -> LatLng {
        let mut lng = self.sw.lng + self.lng_span() * 0.5;
        if lng > 180.0 {
            lng -= 360.0;
        }
        LatLng::new((self.sw.lat + self.ne.lat) * 0.5, lng)
    }

    pub fn contains(&self, p: LatLng) -> bool {
        let lat_ok = p.lat >= self.sw.lat && p.lat <= self.ne.lat;
        let lng_ok = if self.crosses_antimeridian() {
            p.lng >= self.sw.lng || p.lng <= self.ne.lng
        } else {
            p.lng >= self.sw.lng && p.lng <= self.ne.lng
        };
        lat_ok && lng_ok
    }
}
