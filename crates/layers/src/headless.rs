//! In-memory map host.
//!
//! Implements every host capability without a browser: viewport math uses the
//! Web Mercator projection, surfaces and markers are recorded in maps, and the
//! live scene can be exported as an SVG document. `HeadlessMap` is a cheap
//! handle; clones share the same map, which lets tests observe the host while
//! the render cycle owns it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::math::{Projection, Vec2, lat_lng_to_world, world_size, world_to_lat_lng};
use foundation::{Aabb2, GeoBounds, LatLng};
use svg::Document;
use svg::node::element::{Circle, Path};

use crate::diagram::Diagram;
use crate::host::{MarkerLayer, RenderLayer, Viewport, ViewportState};
use crate::symbology::{CellStyle, MarkerStyle, rgba_css};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone)]
pub struct SurfaceRecord {
    /// Div-pixel placement of the surface element.
    pub placement: Aabb2,
    pub drawn: Option<(Diagram, CellStyle)>,
}

#[derive(Debug, Clone)]
pub struct MarkerRecord {
    pub position: LatLng,
    pub label: String,
    pub style: MarkerStyle,
}

type SettleHook = Box<dyn FnMut(ViewportState)>;

struct MapState {
    center: LatLng,
    zoom: f64,
    size: [f64; 2],
    /// World pixel of the overlay pane origin; fixed until the zoom changes.
    pane_origin: Vec2,
    next_id: u64,
    surfaces: BTreeMap<SurfaceId, SurfaceRecord>,
    markers: BTreeMap<MarkerId, MarkerRecord>,
    peak_surfaces: usize,
    surfaces_created: usize,
    on_settle: Option<SettleHook>,
}

impl MapState {
    /// World pixel of the container's top-left corner, `x` wrapped into the
    /// primary world copy.
    fn container_origin(&self) -> Vec2 {
        let c = lat_lng_to_world(self.center, self.zoom);
        let mut origin = c - Vec2::new(self.size[0] * 0.5, self.size[1] * 0.5);
        origin.x = origin.x.rem_euclid(world_size(self.zoom));
        origin
    }

    fn projection(&self) -> Projection {
        Projection::new(self.zoom, self.container_origin(), self.pane_origin)
    }

    fn viewport(&self) -> ViewportState {
        let origin = self.container_origin();
        let ne = world_to_lat_lng(origin + Vec2::new(self.size[0], 0.0), self.zoom);
        let sw = world_to_lat_lng(origin + Vec2::new(0.0, self.size[1]), self.zoom);
        ViewportState {
            bounds: GeoBounds::new(wrap(sw), wrap(ne)),
            center: self.center,
            zoom: self.zoom,
            size: self.size,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn wrap(p: LatLng) -> LatLng {
    let lng = (p.lng + 180.0).rem_euclid(360.0) - 180.0;
    LatLng::new(p.lat, lng)
}

#[derive(Clone)]
pub struct HeadlessMap {
    state: Rc<RefCell<MapState>>,
}

impl std::fmt::Debug for HeadlessMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("HeadlessMap")
            .field("center", &s.center)
            .field("zoom", &s.zoom)
            .field("size", &s.size)
            .field("surfaces", &s.surfaces.len())
            .field("markers", &s.markers.len())
            .finish()
    }
}

impl HeadlessMap {
    pub fn new(center: LatLng, zoom: f64, size: [f64; 2]) -> Self {
        let mut state = MapState {
            center,
            zoom,
            size,
            pane_origin: Vec2::new(0.0, 0.0),
            next_id: 0,
            surfaces: BTreeMap::new(),
            markers: BTreeMap::new(),
            peak_surfaces: 0,
            surfaces_created: 0,
            on_settle: None,
        };
        state.pane_origin = state.container_origin();
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// A map whose container exactly covers `bounds`, `width` pixels wide.
    ///
    /// # Panics
    ///
    /// If `bounds` has no longitudinal extent or `width` is not positive.
    pub fn fit_bounds(bounds: GeoBounds, width: f64) -> Self {
        assert!(
            bounds.lng_span() > 0.0 && width > 0.0,
            "fit_bounds needs a positive span and width: {bounds:?}, {width}"
        );
        let zoom = (width * 360.0 / (256.0 * bounds.lng_span())).log2();
        let nw = lat_lng_to_world(LatLng::new(bounds.north(), bounds.west()), zoom);
        let mut se = lat_lng_to_world(LatLng::new(bounds.south(), bounds.east()), zoom);
        if bounds.crosses_antimeridian() {
            se.x += world_size(zoom);
        }
        let center = wrap(world_to_lat_lng(nw.lerp(se, 0.5), zoom));
        Self::new(center, zoom, [se.x - nw.x, se.y - nw.y])
    }

    /// Called with the new viewport whenever the map settles after `pan_to`.
    pub fn set_settle_hook(&self, hook: impl FnMut(ViewportState) + 'static) {
        self.state.borrow_mut().on_settle = Some(Box::new(hook));
    }

    /// Changes zoom; the overlay pane is re-anchored like a real map does.
    pub fn set_zoom(&self, zoom: f64) {
        {
            let mut s = self.state.borrow_mut();
            s.zoom = zoom;
            s.pane_origin = s.container_origin();
        }
        self.settle();
    }

    fn settle(&self) {
        // Take the hook out so it may call back into the map.
        let (hook, vp) = {
            let mut s = self.state.borrow_mut();
            (s.on_settle.take(), s.viewport())
        };
        if let Some(mut hook) = hook {
            hook(vp);
            let mut s = self.state.borrow_mut();
            if s.on_settle.is_none() {
                s.on_settle = Some(hook);
            }
        }
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.borrow().surfaces.len()
    }

    /// Highest number of simultaneously live surfaces ever observed.
    pub fn peak_surfaces(&self) -> usize {
        self.state.borrow().peak_surfaces
    }

    pub fn surfaces_created(&self) -> usize {
        self.state.borrow().surfaces_created
    }

    pub fn live_markers(&self) -> usize {
        self.state.borrow().markers.len()
    }

    pub fn surfaces(&self) -> Vec<SurfaceRecord> {
        self.state.borrow().surfaces.values().cloned().collect()
    }

    /// Diagram drawn into the newest live surface.
    pub fn drawn_diagram(&self) -> Option<Diagram> {
        self.state
            .borrow()
            .surfaces
            .values()
            .next_back()
            .and_then(|s| s.drawn.as_ref().map(|(d, _)| d.clone()))
    }

    pub fn marker_labels(&self) -> Vec<String> {
        self.state
            .borrow()
            .markers
            .values()
            .map(|m| m.label.clone())
            .collect()
    }

    /// On-demand label display, as a click on the marker would show it.
    pub fn open_marker(&self, id: MarkerId) -> Option<String> {
        self.state.borrow().markers.get(&id).map(|m| m.label.clone())
    }

    /// Renders the live scene in container pixels.
    pub fn to_svg(&self) -> String {
        let s = self.state.borrow();
        let [w, h] = s.size;
        let mut doc = Document::new()
            .set("width", w)
            .set("height", h)
            .set("viewBox", (0.0, 0.0, w, h));

        for surface in s.surfaces.values() {
            let Some((diagram, style)) = &surface.drawn else {
                continue;
            };
            doc = doc.add(
                Path::new()
                    .set("fill", rgba_css(style.fill))
                    .set("stroke", rgba_css(style.stroke))
                    .set("stroke-width", style.stroke_width)
                    .set("d", diagram.render_path()),
            );
        }

        let projection = s.projection();
        for marker in s.markers.values() {
            let p = projection.container_pixel(marker.position);
            doc = doc.add(
                Circle::new()
                    .set("cx", p.x)
                    .set("cy", p.y)
                    .set("r", marker.style.radius)
                    .set("fill", rgba_css(marker.style.color))
                    .set("data-label", marker.label.clone()),
            );
        }
        doc.to_string()
    }
}

impl Viewport for HeadlessMap {
    fn viewport(&self) -> Option<ViewportState> {
        Some(self.state.borrow().viewport())
    }

    fn projection(&self) -> Option<Projection> {
        Some(self.state.borrow().projection())
    }

    fn pan_to(&mut self, center: LatLng) {
        {
            let mut s = self.state.borrow_mut();
            let before = s.container_origin().x;
            s.center = wrap(center);
            // The pane moves continuously; follow the origin across the seam.
            let world = world_size(s.zoom);
            let jump = s.container_origin().x - before;
            if jump > world * 0.5 {
                s.pane_origin.x += world;
            } else if jump < -world * 0.5 {
                s.pane_origin.x -= world;
            }
        }
        self.settle();
    }
}

impl RenderLayer for HeadlessMap {
    type Surface = SurfaceId;

    fn insert_surface(&mut self, placement: Aabb2) -> SurfaceId {
        let mut s = self.state.borrow_mut();
        let id = SurfaceId(s.next_id());
        s.surfaces.insert(
            id,
            SurfaceRecord {
                placement,
                drawn: None,
            },
        );
        s.surfaces_created += 1;
        s.peak_surfaces = s.peak_surfaces.max(s.surfaces.len());
        id
    }

    fn draw_diagram(&mut self, surface: &SurfaceId, diagram: &Diagram, style: &CellStyle) {
        if let Some(record) = self.state.borrow_mut().surfaces.get_mut(surface) {
            record.drawn = Some((diagram.clone(), *style));
        }
    }

    fn remove_surface(&mut self, surface: SurfaceId) {
        self.state.borrow_mut().surfaces.remove(&surface);
    }
}

impl MarkerLayer for HeadlessMap {
    type Marker = MarkerId;

    fn add_marker(&mut self, position: LatLng, label: &str, style: &MarkerStyle) -> MarkerId {
        let mut s = self.state.borrow_mut();
        let id = MarkerId(s.next_id());
        s.markers.insert(
            id,
            MarkerRecord {
                position,
                label: label.to_string(),
                style: *style,
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.state.borrow_mut().markers.remove(&marker);
    }
}

#[cfg(test)]
mod tests {
    use super::HeadlessMap;
    use crate::host::{MarkerLayer, RenderLayer, Viewport};
    use crate::symbology::MarkerStyle;
    use foundation::math::CoordinateTransformer;
    use foundation::{Aabb2, GeoBounds, LatLng};
    use std::cell::Cell;
    use std::rc::Rc;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn munich() -> GeoBounds {
        GeoBounds::new(LatLng::new(48.130, 11.570), LatLng::new(48.140, 11.590))
    }

    #[test]
    fn fit_bounds_reproduces_bounds() {
        let map = HeadlessMap::fit_bounds(munich(), 800.0);
        let vp = map.viewport().unwrap();
        assert_close(vp.bounds.sw.lat, 48.130, 1e-9);
        assert_close(vp.bounds.sw.lng, 11.570, 1e-9);
        assert_close(vp.bounds.ne.lat, 48.140, 1e-9);
        assert_close(vp.bounds.ne.lng, 11.590, 1e-9);
        assert_close(vp.size[0], 800.0, 1e-9);
    }

    #[test]
    fn container_rect_matches_container_size() {
        let map = HeadlessMap::fit_bounds(munich(), 640.0);
        let vp = map.viewport().unwrap();
        let t = CoordinateTransformer::new(map.projection().unwrap());
        let r = t.container_rect(vp.bounds);
        assert_close(r.min[0], 0.0, 1e-6);
        assert_close(r.min[1], 0.0, 1e-6);
        assert_close(r.max[0], vp.size[0], 1e-6);
        assert_close(r.max[1], vp.size[1], 1e-6);
    }

    #[test]
    fn pan_moves_container_but_not_pane() {
        let mut map = HeadlessMap::new(LatLng::new(48.135, 11.58), 15.0, [400.0, 300.0]);
        let before = map.projection().unwrap();
        map.pan_to(LatLng::new(48.136, 11.585));
        let after = map.projection().unwrap();
        assert_ne!(before.container_origin, after.container_origin);
        assert_eq!(before.div_origin, after.div_origin);
    }

    #[test]
    #[should_panic(expected = "positive span")]
    fn fit_bounds_rejects_zero_width_bounds() {
        let point = LatLng::new(48.135, 11.58);
        HeadlessMap::fit_bounds(GeoBounds::new(point, point), 800.0);
    }

    #[test]
    fn pan_across_antimeridian_keeps_pane_offset_continuous() {
        let mut map = HeadlessMap::new(LatLng::new(0.0, 179.9), 6.0, [400.0, 300.0]);
        let t = CoordinateTransformer::new(map.projection().unwrap());
        let p = LatLng::new(0.0, -179.95);
        let offset_before = t.to_div_pixel(p).x - t.to_container_pixel(p).x;

        map.pan_to(LatLng::new(0.0, -179.9));
        let t = CoordinateTransformer::new(map.projection().unwrap());
        let offset_after = t.to_div_pixel(p).x - t.to_container_pixel(p).x;
        let moved = offset_after - offset_before;
        // The container moved 0.2 degrees east; the pane did not move.
        let px = foundation::math::world_size(6.0) * 0.2 / 360.0;
        assert_close(moved, px, 1e-6);
    }

    #[test]
    fn settle_hook_fires_on_pan() {
        let mut map = HeadlessMap::new(LatLng::new(0.0, 0.0), 3.0, [256.0, 256.0]);
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        map.set_settle_hook(move |_| seen.set(seen.get() + 1));
        map.pan_to(LatLng::new(1.0, 1.0));
        map.set_zoom(4.0);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn tracks_surfaces_and_markers() {
        let mut map = HeadlessMap::new(LatLng::new(0.0, 0.0), 3.0, [256.0, 256.0]);
        let a = map.insert_surface(Aabb2::from_extent([0.0, 0.0, 10.0, 10.0]));
        let b = map.insert_surface(Aabb2::from_extent([0.0, 0.0, 10.0, 10.0]));
        assert_eq!(map.peak_surfaces(), 2);
        map.remove_surface(a);
        map.remove_surface(b);
        assert_eq!(map.live_surfaces(), 0);

        let m = map.add_marker(LatLng::new(0.0, 0.0), "Cafe Luitpold", &MarkerStyle::default());
        assert_eq!(map.open_marker(m).as_deref(), Some("Cafe Luitpold"));
        assert!(map.to_svg().contains("Cafe Luitpold"));
        map.remove_marker(m);
        assert_eq!(map.live_markers(), 0);
    }
}
