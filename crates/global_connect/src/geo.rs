//! Sphere projection and great-arc helpers for the globe.

use bevy::math::Vec3;

/// Projects a latitude/longitude pair (degrees) onto a Y-up sphere.
///
/// Longitude is offset by 180 degrees so that (0, 0) lands on the -X axis.
/// Out-of-range input is not validated; the trigonometry wraps it.
pub fn lat_lon_to_vec3(lat_deg: f32, lon_deg: f32, radius: f32) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lon_deg + 180.0).to_radians();

    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Control point lifting an arc off the surface in proportion to its span.
pub fn arc_control_point(start: Vec3, end: Vec3, globe_radius: f32) -> Vec3 {
    let lift = globe_radius + start.distance(end) * 0.5;
    ((start + end) * 0.5).normalize_or_zero() * lift
}

pub fn quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// `segments + 1` points along the lifted arc from `start` to `end`.
pub fn arc_points(start: Vec3, end: Vec3, globe_radius: f32, segments: usize) -> Vec<Vec3> {
    let control = arc_control_point(start, end, globe_radius);
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| quadratic_bezier(start, control, end, i as f32 / segments as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        let diff = a.distance(b);
        assert!(diff <= 1e-4, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_maps_to_negative_x() {
        assert_close(lat_lon_to_vec3(0.0, 0.0, 5.0), Vec3::new(-5.0, 0.0, 0.0));
    }

    #[test]
    fn north_pole_ignores_longitude() {
        for lon in [-180.0, -73.9, 0.0, 42.0, 179.0] {
            assert_close(lat_lon_to_vec3(90.0, lon, 2.5), Vec3::new(0.0, 2.5, 0.0));
        }
    }

    #[test]
    fn projected_points_stay_on_the_sphere() {
        for (lat, lon) in [(38.9, -77.0), (-35.28, 149.13), (120.0, 400.0)] {
            let p = lat_lon_to_vec3(lat, lon, 5.0);
            assert!((p.length() - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn arc_endpoints_match_and_midpoint_is_lifted() {
        let start = lat_lon_to_vec3(48.85, 2.35, 5.0);
        let end = lat_lon_to_vec3(37.42, -122.08, 5.0);
        let points = arc_points(start, end, 5.0, 30);

        assert_eq!(points.len(), 31);
        assert_close(points[0], start);
        assert_close(points[30], end);
        assert!(points[15].length() > 5.0);
    }
}
