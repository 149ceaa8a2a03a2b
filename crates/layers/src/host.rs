//! Capabilities the map host provides to the overlay engine.
//!
//! A host is split into three narrow traits so overlays, markers and the
//! render cycle each depend only on what they use. [`MapHost`] is the union
//! and is implemented automatically.

use foundation::math::Projection;
use foundation::{Aabb2, GeoBounds, LatLng};

use crate::diagram::Diagram;
use crate::symbology::{CellStyle, MarkerStyle};

/// Snapshot of the visible map area.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    pub bounds: GeoBounds,
    pub center: LatLng,
    pub zoom: f64,
    /// Container size in pixels `[width, height]`.
    pub size: [f64; 2],
}

pub trait Viewport {
    /// Current viewport, or `None` before the map has loaded.
    fn viewport(&self) -> Option<ViewportState>;

    /// Projection bound to the current viewport.
    fn projection(&self) -> Option<Projection>;

    /// Re-centers the map. Hosts report the change through a later settle event.
    fn pan_to(&mut self, center: LatLng);
}

/// The render layer overlays insert their surface into.
pub trait RenderLayer {
    type Surface;

    /// Creates a surface placed at `placement` (div-pixel space) and inserts it.
    fn insert_surface(&mut self, placement: Aabb2) -> Self::Surface;

    /// Draws the diagram's cell boundaries into `surface`.
    fn draw_diagram(&mut self, surface: &Self::Surface, diagram: &Diagram, style: &CellStyle);

    /// Removes `surface` and everything drawn into it.
    fn remove_surface(&mut self, surface: Self::Surface);
}

pub trait MarkerLayer {
    type Marker;

    /// Adds a point marker. `label` is shown on demand (hover/click).
    fn add_marker(&mut self, position: LatLng, label: &str, style: &MarkerStyle) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);
}

pub trait MapHost: Viewport + RenderLayer + MarkerLayer {}

impl<T: Viewport + RenderLayer + MarkerLayer> MapHost for T {}
