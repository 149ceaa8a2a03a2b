use foundation::Site;
use tracing::debug;

use crate::host::MarkerLayer;
use crate::symbology::MarkerStyle;

/// Point markers owned by one render cycle.
#[derive(Debug)]
pub struct MarkerSet<M> {
    markers: Vec<(M, Site)>,
    style: MarkerStyle,
}

impl<M> Default for MarkerSet<M> {
    fn default() -> Self {
        Self::new(MarkerStyle::default())
    }
}

impl<M> MarkerSet<M> {
    pub fn new(style: MarkerStyle) -> Self {
        Self {
            markers: Vec::new(),
            style,
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.markers.iter().map(|(_, site)| site)
    }

    /// Label carried by the `index`-th marker.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.markers.get(index).map(|(_, site)| site.label.as_str())
    }

    /// Adds one marker per site. Existing markers are kept.
    pub fn populate<H>(&mut self, host: &mut H, sites: &[Site])
    where
        H: MarkerLayer<Marker = M> + ?Sized,
    {
        self.markers.reserve(sites.len());
        for site in sites {
            let marker = host.add_marker(site.position, &site.label, &self.style);
            self.markers.push((marker, site.clone()));
        }
        debug!(markers = self.markers.len(), "markers populated");
    }

    /// Removes every owned marker from the host.
    pub fn clear<H>(&mut self, host: &mut H)
    where
        H: MarkerLayer<Marker = M> + ?Sized,
    {
        if self.markers.is_empty() {
            return;
        }
        let removed = self.markers.len();
        for (marker, _) in self.markers.drain(..) {
            host.remove_marker(marker);
        }
        debug!(removed, "markers cleared");
    }
}
