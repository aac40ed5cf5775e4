//! Frame rotations and angle utilities

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotate an acceleration from the body frame into the earth frame.
///
/// Body frame: x = forward, y = left (from the rover's perspective).
/// Earth frame: x = east, y = north (fixed to the ground).
///
/// `heading_deg` is the rover heading in degrees clockwise from north. The
/// rotation maps the body forward axis fully onto the heading direction, so
/// forward acceleration while heading north is pure north acceleration.
pub fn body_to_earth(ax_body_mss: f64, ay_body_mss: f64, heading_deg: f64) -> (f64, f64) {
    let heading_rad = heading_deg.to_radians();

    let ax_east_mss = ax_body_mss * heading_rad.sin() + ay_body_mss * heading_rad.cos();
    let ay_north_mss = ax_body_mss * heading_rad.cos() - ay_body_mss * heading_rad.sin();

    (ax_east_mss, ay_north_mss)
}

/// Normalise an angle into the range `[0, 360)` degrees.
pub fn normalize_angle(angle_deg: f64) -> f64 {
    let norm = angle_deg.rem_euclid(360.0);

    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if norm >= 360.0 {
        0.0
    } else {
        norm
    }
}

/// Shortest signed angular difference `target - current` in degrees.
///
/// Returns a value in `(-180, 180]`: positive means the target is clockwise
/// of the current angle (turn right), negative means anticlockwise (turn
/// left).
pub fn angle_difference(target_deg: f64, current_deg: f64) -> f64 {
    let diff = normalize_angle(target_deg - current_deg);

    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Euclidean distance between two points in the local frame.
pub fn distance_2d(x1_m: f64, y1_m: f64, x2_m: f64, y2_m: f64) -> f64 {
    (x2_m - x1_m).hypot(y2_m - y1_m)
}

/// Bearing from point 1 to point 2 in degrees, `[0, 360)`.
///
/// 0° = north, 90° = east, which is why the arguments to `atan2` are
/// `(east, north)` rather than the mathematical `(y, x)` convention.
pub fn bearing_to_point(x1_m: f64, y1_m: f64, x2_m: f64, y2_m: f64) -> f64 {
    let dx_m = x2_m - x1_m;
    let dy_m = y2_m - y1_m;

    normalize_angle(dx_m.atan2(dy_m).to_degrees())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {} to be close to {}", a, b);
    }

    #[test]
    fn test_body_to_earth() {
        // Forward while heading north is pure north
        let (ax_east, ay_north) = body_to_earth(1.0, 0.0, 0.0);
        assert_close(ax_east, 0.0);
        assert_close(ay_north, 1.0);

        // Forward while heading east is pure east
        let (ax_east, ay_north) = body_to_earth(1.0, 0.0, 90.0);
        assert_close(ax_east, 1.0);
        assert_close(ay_north, 0.0);

        // Leftward while heading north maps onto east per the rotation
        // convention
        let (ax_east, ay_north) = body_to_earth(0.0, 1.0, 0.0);
        assert_close(ax_east, 1.0);
        assert_close(ay_north, 0.0);

        // Forward while heading south is pure south
        let (ax_east, ay_north) = body_to_earth(1.0, 0.0, 180.0);
        assert_close(ax_east, 0.0);
        assert_close(ay_north, -1.0);
    }

    #[test]
    fn test_normalize_angle() {
        assert_close(normalize_angle(0.0), 0.0);
        assert_close(normalize_angle(360.0), 0.0);
        assert_close(normalize_angle(725.0), 5.0);
        assert_close(normalize_angle(-10.0), 350.0);
        assert_close(normalize_angle(-720.0), 0.0);

        for &a in &[1234.5, -1234.5, 1e7, -1e7, 359.999, -0.001] {
            let norm = normalize_angle(a);
            assert!(
                (0.0..360.0).contains(&norm),
                "normalize_angle({}) = {} out of range",
                a,
                norm
            );
        }
    }

    #[test]
    fn test_angle_difference() {
        assert_close(angle_difference(90.0, 80.0), 10.0);
        assert_close(angle_difference(10.0, 350.0), 20.0);
        assert_close(angle_difference(350.0, 10.0), -20.0);

        // The half turn is reported as +180, not -180
        assert_close(angle_difference(180.0, 0.0), 180.0);

        for &(t, c) in &[(0.0, 0.0), (721.0, -45.0), (359.0, 1.0), (90.0, 270.1)] {
            let diff = angle_difference(t, c);
            assert!(
                diff > -180.0 && diff <= 180.0,
                "angle_difference({}, {}) = {} out of range",
                t,
                c,
                diff
            );
        }
    }

    #[test]
    fn test_distance_2d() {
        assert_close(distance_2d(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_close(distance_2d(1.0, 1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_bearing_to_point() {
        // Due north
        assert_close(bearing_to_point(0.0, 0.0, 0.0, 10.0), 0.0);
        // Due east
        assert_close(bearing_to_point(0.0, 0.0, 10.0, 0.0), 90.0);
        // Due south
        assert_close(bearing_to_point(0.0, 0.0, 0.0, -10.0), 180.0);
        // Due west
        assert_close(bearing_to_point(0.0, 0.0, -10.0, 0.0), 270.0);
        // North east
        assert_close(bearing_to_point(0.0, 0.0, 1.0, 1.0), 45.0);
    }
}
