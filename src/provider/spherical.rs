//! Spherical geometry on a sphere of Earth's equatorial radius.

use std::f64::consts::PI;

use super::LatLng;

/// Earth radius in meters (WGS84 semi-major axis)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Area of a closed path in square meters.
///
/// The path is implicitly closed: the last vertex connects back to the
/// first. Paths with fewer than three vertices enclose nothing.
pub fn compute_area(path: &[LatLng]) -> f64 {
    compute_signed_area(path).abs()
}

/// Signed area of a closed path in square meters.
/// Counter-clockwise paths are positive, clockwise paths negative.
pub fn compute_signed_area(path: &[LatLng]) -> f64 {
    compute_signed_area_with_radius(path, EARTH_RADIUS)
}

/// Signed area on a sphere of the given radius.
///
/// Sums the signed areas of the polar triangles formed by each edge and
/// the north pole, which stays well conditioned for small polygons.
pub fn compute_signed_area_with_radius(path: &[LatLng], radius: f64) -> f64 {
    let Some(last) = path.last() else {
        return 0.0;
    };
    if path.len() < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut prev_tan_lat = tan_half_colatitude(last.lat);
    let mut prev_lng = last.lng.to_radians();

    for point in path {
        let tan_lat = tan_half_colatitude(point.lat);
        let lng = point.lng.to_radians();
        total += polar_triangle_area(tan_lat, lng, prev_tan_lat, prev_lng);
        prev_tan_lat = tan_lat;
        prev_lng = lng;
    }

    total * radius * radius
}

/// Great-circle distance between two points in meters (haversine)
pub fn compute_distance_between(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().min(1.0).asin()
}

/// Length of an open path in meters
pub fn compute_length(path: &[LatLng]) -> f64 {
    path.windows(2)
        .map(|pair| compute_distance_between(pair[0], pair[1]))
        .sum()
}

/// Length of the closed ring through `path`, including the closing edge
pub fn compute_perimeter(path: &[LatLng]) -> f64 {
    match (path.first(), path.last()) {
        (Some(&first), Some(&last)) if path.len() > 1 => {
            compute_length(path) + compute_distance_between(last, first)
        }
        _ => 0.0,
    }
}

#[inline(always)]
fn tan_half_colatitude(lat: f64) -> f64 {
    ((PI / 2.0 - lat.to_radians()) / 2.0).tan()
}

/// Signed area of the triangle (pole, p1, p2) on the unit sphere
#[inline(always)]
fn polar_triangle_area(tan1: f64, lng1: f64, tan2: f64, lng2: f64) -> f64 {
    let delta_lng = lng1 - lng2;
    let t = tan1 * tan2;
    2.0 * (t * delta_lng.sin()).atan2(1.0 + t * delta_lng.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn octant() -> Vec<LatLng> {
        vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 90.0),
            LatLng::new(90.0, 0.0),
        ]
    }

    #[test]
    fn test_octant_area() {
        let expected = 4.0 * PI * EARTH_RADIUS * EARTH_RADIUS / 8.0;
        assert_relative_eq!(compute_area(&octant()), expected, max_relative = 1e-9);
    }

    #[test]
    fn test_orientation_sign() {
        let ccw = octant();
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert!(compute_signed_area(&ccw) > 0.0);
        assert!(compute_signed_area(&cw) < 0.0);
        assert_relative_eq!(compute_area(&ccw), compute_area(&cw), max_relative = 1e-12);
    }

    #[test]
    fn test_degenerate_paths() {
        assert_eq!(compute_area(&[]), 0.0);
        assert_eq!(compute_area(&[LatLng::new(1.0, 1.0)]), 0.0);
        assert_eq!(
            compute_area(&[LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]),
            0.0
        );
    }

    #[test]
    fn test_small_square_near_equator() {
        // 0.01° square: ~1113m per side
        let square = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.01),
            LatLng::new(0.01, 0.01),
            LatLng::new(0.01, 0.0),
        ];
        let side = EARTH_RADIUS * 0.01_f64.to_radians();
        assert_relative_eq!(compute_area(&square), side * side, max_relative = 1e-4);
    }

    #[test]
    fn test_explicitly_closed_path_matches_open() {
        let mut closed = octant();
        closed.push(closed[0]);
        assert_relative_eq!(compute_area(&closed), compute_area(&octant()), max_relative = 1e-12);
    }

    #[test]
    fn test_distance_quarter_meridian() {
        let d = compute_distance_between(LatLng::new(0.0, 0.0), LatLng::new(90.0, 0.0));
        assert_relative_eq!(d, PI / 2.0 * EARTH_RADIUS, max_relative = 1e-12);
    }

    #[test]
    fn test_perimeter_closes_ring() {
        let quarter = PI / 2.0 * EARTH_RADIUS;
        assert_relative_eq!(compute_length(&octant()), 2.0 * quarter, max_relative = 1e-9);
        assert_relative_eq!(compute_perimeter(&octant()), 3.0 * quarter, max_relative = 1e-9);
        assert_eq!(compute_perimeter(&[LatLng::new(1.0, 2.0)]), 0.0);
    }
}
