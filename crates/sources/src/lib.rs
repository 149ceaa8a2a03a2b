//! Point-of-interest and geocoding providers.

pub mod fixture;
pub mod nominatim;
pub mod overpass;
pub mod provider;

pub use fixture::{FixtureError, PoiRecord, StaticGeocoder, StaticPointProvider};
pub use nominatim::NominatimGeocoder;
pub use overpass::OverpassProvider;
pub use provider::*;
