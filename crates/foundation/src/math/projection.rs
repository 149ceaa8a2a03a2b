//! Spherical Web Mercator projection and the pixel-space transformer.
//!
//! World pixels follow the XYZ tile scheme: the whole world is a square of
//! `TILE_SIZE * 2^zoom` pixels with the origin at the north-west corner, so
//! `y` grows southward. Two offsets are layered on top:
//!
//! - container pixels: relative to the map container's top-left corner, used
//!   for all geometry;
//! - div pixels: relative to the overlay pane's origin, used only to place the
//!   overlay element in page layout.

use super::Vec2;
use crate::bounds::Aabb2;
use crate::geo::{GeoBounds, LatLng};

/// Side length of a world tile at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Sine of the latitude clamp used by Web Mercator (about ±85.05°).
const MAX_SIN_LAT: f64 = 0.9999;

/// World pixels a point may sit west of the container origin before it is
/// taken to lie one world copy further east. Absorbs round-trip error of
/// viewport edges.
const WRAP_SLACK_PX: f64 = 1.0;

/// Width (and height) of the world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Projects a geographic coordinate to world pixels at `zoom`.
pub fn lat_lng_to_world(p: LatLng, zoom: f64) -> Vec2 {
    let scale = world_size(zoom);
    let sin_lat = p.lat.to_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    let x = (p.lng + 180.0) / 360.0;
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI);
    Vec2::new(x * scale, y * scale)
}

/// Inverse of [`lat_lng_to_world`].
pub fn world_to_lat_lng(p: Vec2, zoom: f64) -> LatLng {
    let scale = world_size(zoom);
    let lng = p.x / scale * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * p.y / scale);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Projection bound to one viewport.
///
/// Hosts hand out a fresh value every time the viewport changes; holding on to
/// an old one yields pixels for a viewport that is no longer on screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub zoom: f64,
    /// World pixel of the container's top-left corner.
    pub container_origin: Vec2,
    /// World pixel of the overlay pane's origin.
    pub div_origin: Vec2,
}

impl Projection {
    pub fn new(zoom: f64, container_origin: Vec2, div_origin: Vec2) -> Self {
        Self {
            zoom,
            container_origin,
            div_origin,
        }
    }

    /// World pixel of `p` on the world copy the container shows.
    ///
    /// `x` lands in `[container_origin.x - slack, container_origin.x - slack + world)`,
    /// so points east of the antimeridian stay to the right of points west of it
    /// whenever the container straddles the seam.
    pub fn world_pixel(&self, p: LatLng) -> Vec2 {
        let mut w = lat_lng_to_world(p, self.zoom);
        let world = world_size(self.zoom);
        let west = self.container_origin.x - WRAP_SLACK_PX;
        w.x = west + (w.x - west).rem_euclid(world);
        w
    }

    pub fn container_pixel(&self, p: LatLng) -> Vec2 {
        self.world_pixel(p) - self.container_origin
    }

    pub fn div_pixel(&self, p: LatLng) -> Vec2 {
        self.world_pixel(p) - self.div_origin
    }
}

/// Converts geographic coordinates into the two pixel spaces of one viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateTransformer {
    projection: Projection,
}

impl CoordinateTransformer {
    pub fn new(projection: Projection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn to_container_pixel(&self, p: LatLng) -> Vec2 {
        self.projection.container_pixel(p)
    }

    pub fn to_div_pixel(&self, p: LatLng) -> Vec2 {
        self.projection.div_pixel(p)
    }

    /// Container-pixel rectangle of `bounds`, as `[west_x, north_y, east_x, south_y]`.
    ///
    /// Latitude grows upward while pixel `y` grows downward, so the north edge
    /// supplies the minimum `y`.
    pub fn container_rect(&self, bounds: GeoBounds) -> Aabb2 {
        self.rect(bounds, |p| self.to_container_pixel(p))
    }

    /// Div-pixel rectangle of `bounds`, used to size and place the surface.
    pub fn div_rect(&self, bounds: GeoBounds) -> Aabb2 {
        self.rect(bounds, |p| self.to_div_pixel(p))
    }

    fn rect(&self, bounds: GeoBounds, project: impl Fn(LatLng) -> Vec2) -> Aabb2 {
        let sw = project(bounds.sw);
        let ne = project(bounds.ne);
        let mut east_x = ne.x;
        // A viewport spanning the whole world maps both edges to the same copy.
        if east_x <= sw.x && bounds.lng_span() > 0.0 {
            east_x += world_size(self.projection.zoom);
        }
        Aabb2::from_extent([sw.x, ne.y, east_x, sw.y])
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CoordinateTransformer, Projection, lat_lng_to_world, world_size, world_to_lat_lng,
    };
    use crate::geo::{GeoBounds, LatLng};
    use crate::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let p = lat_lng_to_world(LatLng::new(0.0, 0.0), 0.0);
        assert_close(p.x, 128.0, 1e-9);
        assert_close(p.y, 128.0, 1e-9);
        assert_close(world_size(2.0), 1024.0, 1e-9);
    }

    #[test]
    fn world_round_trip() {
        let geo = LatLng::new(48.137, 11.575);
        let w = lat_lng_to_world(geo, 15.5);
        let rt = world_to_lat_lng(w, 15.5);
        assert_close(rt.lat, geo.lat, 1e-9);
        assert_close(rt.lng, geo.lng, 1e-9);
    }

    #[test]
    fn container_and_div_differ_only_by_origin() {
        let proj = Projection::new(3.0, Vec2::new(100.0, 50.0), Vec2::new(90.0, 40.0));
        let t = CoordinateTransformer::new(proj);
        let p = LatLng::new(10.0, 20.0);
        let c = t.to_container_pixel(p);
        let d = t.to_div_pixel(p);
        assert_close(d.x - c.x, 10.0, 1e-9);
        assert_close(d.y - c.y, 10.0, 1e-9);
    }

    #[test]
    fn container_rect_flips_vertical_axis() {
        let bounds = GeoBounds::new(LatLng::new(48.130, 11.570), LatLng::new(48.140, 11.590));
        let zoom = 15.0;
        let origin = lat_lng_to_world(LatLng::new(48.140, 11.570), zoom);
        let t = CoordinateTransformer::new(Projection::new(zoom, origin, origin));
        let r = t.container_rect(bounds);
        assert!(r.is_valid(), "rect must have min < max: {r:?}");
        assert_close(r.min[0], 0.0, 1e-9);
        assert_close(r.min[1], 0.0, 1e-9);
        // North edge is the minimum y; south edge is the maximum y.
        let north_y = t.to_container_pixel(bounds.ne).y;
        let south_y = t.to_container_pixel(bounds.sw).y;
        assert!(north_y < south_y);
        assert_eq!(r.extent()[1], north_y);
        assert_eq!(r.extent()[3], south_y);
    }

    #[test]
    fn rect_across_antimeridian_stays_positive() {
        let bounds = GeoBounds::new(LatLng::new(-5.0, 175.0), LatLng::new(5.0, -175.0));
        let zoom = 4.0;
        let origin = lat_lng_to_world(LatLng::new(5.0, 175.0), zoom);
        let t = CoordinateTransformer::new(Projection::new(zoom, origin, origin));
        let r = t.container_rect(bounds);
        assert!(r.is_valid());
        assert_close(r.width(), world_size(zoom) * 10.0 / 360.0, 1e-6);
    }

    #[test]
    fn sites_east_of_antimeridian_unwrap_into_container() {
        let zoom = 4.0;
        let origin = lat_lng_to_world(LatLng::new(5.0, 175.0), zoom);
        let t = CoordinateTransformer::new(Projection::new(zoom, origin, origin));
        let west = t.to_container_pixel(LatLng::new(0.0, 178.0));
        let east = t.to_container_pixel(LatLng::new(0.0, -178.0));
        let px_per_deg = world_size(zoom) / 360.0;
        assert_close(west.x, 3.0 * px_per_deg, 1e-6);
        assert_close(east.x, 7.0 * px_per_deg, 1e-6);
    }

    #[test]
    fn negative_container_origin_is_equivalent_to_wrapped_one() {
        let zoom = 3.0;
        let world = world_size(zoom);
        let origin = Vec2::new(-100.0, 300.0);
        let wrapped = Vec2::new(world - 100.0, 300.0);
        let a = CoordinateTransformer::new(Projection::new(zoom, origin, origin));
        let b = CoordinateTransformer::new(Projection::new(zoom, wrapped, wrapped));
        for lng in [-179.0, -170.0, 175.0] {
            let p = LatLng::new(10.0, lng);
            assert_close(a.to_container_pixel(p).x, b.to_container_pixel(p).x, 1e-6);
        }
    }
}
