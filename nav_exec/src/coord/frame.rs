//! Local planar reference frame

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{CoordError, M_PER_DEG_LAT, M_PER_DEG_LON_EQUATOR};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The local planar reference frame.
///
/// The frame is anchored at a single lat/lon origin which is armed exactly
/// once per session, from the first valid absolute fix after startup. All
/// local coordinates are metres east (x) and north (y) of that origin, and
/// are only meaningful against the origin they were computed with.
///
/// The conversions use a flat earth approximation: metres per degree of
/// latitude is constant, metres per degree of longitude is scaled by the
/// cosine of the origin latitude. `xy_to_latlon` is the exact inverse of
/// `latlon_to_xy` under the same approximation, not a geodesic inverse.
#[derive(Debug, Default, Clone)]
pub struct RefFrame {
    origin: Option<Origin>,
}

/// The armed origin of a [`RefFrame`].
#[derive(Debug, Clone, Copy)]
struct Origin {
    /// Origin latitude. Units: degrees
    lat0_deg: f64,

    /// Origin longitude. Units: degrees
    lon0_deg: f64,

    /// Metres per degree of longitude at the origin latitude.
    m_per_deg_lon: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RefFrame {
    /// Create a new frame with no origin armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the frame origin.
    ///
    /// Returns [`CoordError::OriginAlreadySet`] if an origin is already
    /// armed, the origin is immutable for the rest of the session.
    pub fn set_origin(&mut self, lat_deg: f64, lon_deg: f64) -> Result<(), CoordError> {
        if self.origin.is_some() {
            return Err(CoordError::OriginAlreadySet);
        }

        self.origin = Some(Origin {
            lat0_deg: lat_deg,
            lon0_deg: lon_deg,
            m_per_deg_lon: M_PER_DEG_LON_EQUATOR * lat_deg.to_radians().cos(),
        });

        Ok(())
    }

    /// True if the frame origin has been armed.
    pub fn has_origin(&self) -> bool {
        self.origin.is_some()
    }

    /// The armed origin as `(lat_deg, lon_deg)`, or `None` if unarmed.
    pub fn origin(&self) -> Option<(f64, f64)> {
        self.origin.map(|o| (o.lat0_deg, o.lon0_deg))
    }

    /// Convert a lat/lon position into local east/north metres.
    pub fn latlon_to_xy(&self, lat_deg: f64, lon_deg: f64) -> Result<(f64, f64), CoordError> {
        let origin = self.origin.ok_or(CoordError::NoOrigin)?;

        let x_m = (lon_deg - origin.lon0_deg) * origin.m_per_deg_lon;
        let y_m = (lat_deg - origin.lat0_deg) * M_PER_DEG_LAT;

        Ok((x_m, y_m))
    }

    /// Convert local east/north metres back into a lat/lon position.
    pub fn xy_to_latlon(&self, x_m: f64, y_m: f64) -> Result<(f64, f64), CoordError> {
        let origin = self.origin.ok_or(CoordError::NoOrigin)?;

        let lat_deg = origin.lat0_deg + (y_m / M_PER_DEG_LAT);
        let lon_deg = origin.lon0_deg + (x_m / origin.m_per_deg_lon);

        Ok((lat_deg, lon_deg))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn armed_frame() -> RefFrame {
        let mut frame = RefFrame::new();
        frame.set_origin(33.7015, -117.7528).unwrap();
        frame
    }

    #[test]
    fn test_origin_set_once() {
        let mut frame = RefFrame::new();
        assert!(!frame.has_origin());

        frame.set_origin(33.7015, -117.7528).unwrap();
        assert!(frame.has_origin());
        assert_eq!(frame.origin(), Some((33.7015, -117.7528)));

        // Second arm attempt must be rejected
        assert!(matches!(
            frame.set_origin(0.0, 0.0),
            Err(CoordError::OriginAlreadySet)
        ));
    }

    #[test]
    fn test_no_origin_is_error() {
        let frame = RefFrame::new();
        assert!(matches!(
            frame.latlon_to_xy(33.7, -117.7),
            Err(CoordError::NoOrigin)
        ));
        assert!(matches!(
            frame.xy_to_latlon(10.0, 10.0),
            Err(CoordError::NoOrigin)
        ));
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let frame = armed_frame();
        let (x_m, y_m) = frame.latlon_to_xy(33.7015, -117.7528).unwrap();
        assert!(x_m.abs() < 1e-9);
        assert!(y_m.abs() < 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let frame = armed_frame();

        for &(x_m, y_m) in &[
            (30.0, 50.0),
            (-120.5, 0.25),
            (0.0, 0.0),
            (1.0e4, -3.3e3),
        ] {
            let (lat_deg, lon_deg) = frame.xy_to_latlon(x_m, y_m).unwrap();
            let (x2_m, y2_m) = frame.latlon_to_xy(lat_deg, lon_deg).unwrap();

            assert!(
                (x_m - x2_m).abs() <= 1e-6 * x_m.abs().max(1.0),
                "x round trip failed: {} vs {}",
                x_m,
                x2_m
            );
            assert!(
                (y_m - y2_m).abs() <= 1e-6 * y_m.abs().max(1.0),
                "y round trip failed: {} vs {}",
                y_m,
                y2_m
            );
        }
    }

    #[test]
    fn test_north_east_signs() {
        let frame = armed_frame();

        // A point north east of the origin must have positive x and y
        let (x_m, y_m) = frame.latlon_to_xy(33.7025, -117.7518).unwrap();
        assert!(x_m > 0.0);
        assert!(y_m > 0.0);

        // One degree of latitude is the fixed constant
        let (_, y_deg_m) = frame.latlon_to_xy(34.7015, -117.7528).unwrap();
        assert!((y_deg_m - M_PER_DEG_LAT).abs() < 1e-6);
    }
}
