use glam::DVec2;
use std::f64::consts::PI;

use crate::provider::LatLng;

/// Web Mercator latitude limit
pub const MAX_LATITUDE: f64 = 85.051_128_78;

const ZOOM_MIN: f64 = 0.5;
const ZOOM_MAX: f64 = (1u64 << 21) as f64;
const ZOOM_STEP: f64 = 1.5;

/// Visible map area. `zoom` is a scale factor: at 1.0 the whole world
/// spans the viewport width, each web-map zoom level doubles it.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator coordinates, both axes in [0, 1], y down
pub fn mercator(point: LatLng) -> DVec2 {
    let lat_rad = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    DVec2::new(
        (point.lng + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

pub fn inverse_mercator(p: DVec2) -> LatLng {
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    LatLng::new(lat, p.x * 360.0 - 180.0)
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom: zoom.clamp(ZOOM_MIN, ZOOM_MAX),
            width,
            height,
        }
    }

    /// Viewport at a web-map zoom level (0 = whole world)
    pub fn from_zoom_level(center: LatLng, level: f64, width: usize, height: usize) -> Self {
        Self::new(center, 2f64.powf(level), width, height)
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom.log2()
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let mut c = mercator(self.center) + DVec2::new(dx as f64, dy as f64) / self.scale();
        c.x = c.x.rem_euclid(1.0);
        c.y = c.y.clamp(0.0, 1.0);
        self.center = inverse_mercator(c);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(ZOOM_MIN);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let anchor = mercator(self.unproject(px, py));
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);

        // Re-center so the anchor lands back under the pointer
        let offset = (DVec2::new(px as f64, py as f64) - self.half_size()) / self.scale();
        let mut c = anchor - offset;
        c.x = c.x.rem_euclid(1.0);
        c.y = c.y.clamp(0.0, 1.0);
        self.center = inverse_mercator(c);
    }

    /// Pixel position to geographic coordinate
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let p = (DVec2::new(px as f64, py as f64) - self.half_size()) / self.scale()
            + mercator(self.center);
        inverse_mercator(p)
    }

    /// Geographic coordinate to sub-pixel position
    pub fn project_f(&self, point: LatLng) -> DVec2 {
        let mut d = mercator(point) - mercator(self.center);
        // Take the short way around the antimeridian
        if d.x > 0.5 {
            d.x -= 1.0;
        } else if d.x < -0.5 {
            d.x += 1.0;
        }
        d * self.scale() + self.half_size()
    }

    /// Geographic coordinate to pixel position
    pub fn project(&self, point: LatLng) -> (i32, i32) {
        let p = self.project_f(point);
        (p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Rough bounding box check for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(LatLng::new(0.0, 0.0), 1.0, 100, 100);
        assert_eq!(vp.project(LatLng::new(0.0, 0.0)), (50, 50));
    }

    #[test]
    fn test_zoom_level_round_trip() {
        let vp = Viewport::from_zoom_level(LatLng::new(37.7749, -122.4194), 10.0, 200, 100);
        assert_abs_diff_eq!(vp.zoom_level(), 10.0, epsilon = 1e-9);
        assert_eq!(vp.project(vp.center), (100, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::from_zoom_level(LatLng::new(37.7749, -122.4194), 10.0, 200, 100);
        let p = vp.project_f(vp.unproject(37, 81));
        assert_abs_diff_eq!(p.x, 37.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 81.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pan_moves_east_and_north() {
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 1.0, 100, 100);
        vp.pan(10, -10);
        assert!(vp.center.lng > 0.0);
        assert!(vp.center.lat > 0.0);
    }

    #[test]
    fn test_pan_wraps_antimeridian() {
        let mut vp = Viewport::new(LatLng::new(0.0, 179.0), 1.0, 360, 100);
        vp.pan(5, 0);
        assert!(vp.center.lng < -170.0);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::from_zoom_level(LatLng::new(37.7749, -122.4194), 8.0, 200, 100);
        let before = vp.unproject(30, 20);
        vp.zoom_in_at(30, 20);
        let after = vp.unproject(30, 20);
        assert_abs_diff_eq!(before.lat, after.lat, epsilon = 1e-2);
        assert_abs_diff_eq!(before.lng, after.lng, epsilon = 1e-2);
    }

    #[test]
    fn test_zoom_limits() {
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 1.0, 100, 100);
        for _ in 0..10 {
            vp.zoom_out();
        }
        assert_abs_diff_eq!(vp.zoom, ZOOM_MIN);
    }
}
