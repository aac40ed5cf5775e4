//! Implementations for the HeadEst state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{HeadEstError, Params};
use crate::coord;
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading estimation module state.
///
/// Holds only the calibration parameters, the heading itself is a derived
/// value recomputed on every `proc` call.
#[derive(Debug, Default)]
pub struct HeadEst {
    pub(crate) params: Params,
}

/// Input data to heading estimation.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Raw magnetic field vector in the sensor frame.
    ///
    /// Units: raw sensor counts (any consistent fixed scale)
    pub mag_raw: Vector3<f64>,

    /// Acceleration vector in the sensor frame, gravity inclusive.
    ///
    /// Units: meters/second^2
    pub accel_mss: Vector3<f64>,
}

/// Status report for heading estimation.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Magnitude of the input acceleration vector.
    ///
    /// Units: meters/second^2
    pub accel_norm_mss: f64,

    /// Recovered pitch of the platform.
    ///
    /// Units: radians
    pub pitch_rad: f64,

    /// Recovered roll of the platform.
    ///
    /// Units: radians
    pub roll_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadEst {
    /// Build a HeadEst directly from a parameter struct, used by tests.
    pub fn from_params(params: Params) -> Self {
        Self { params }
    }
}

impl State for HeadEst {
    type InitData = &'static str;
    type InitError = HeadEstError;

    type InputData = InputData;
    type OutputData = f64;
    type StatusReport = StatusReport;
    type ProcError = HeadEstError;

    /// Initialise the HeadEst module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data).map_err(HeadEstError::ParamLoadError)?;

        Ok(())
    }

    /// Compute the tilt-compensated heading for one pair of readings.
    ///
    /// Output is the heading in degrees, `[0, 360)`.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = StatusReport::default();

        // Remove the hard iron offsets from the raw magnetic reading
        let mag = Vector3::new(
            input_data.mag_raw.x - self.params.mag_offset_x,
            input_data.mag_raw.y - self.params.mag_offset_y,
            input_data.mag_raw.z - self.params.mag_offset_z,
        );

        // Normalise the acceleration vector. A zero magnitude means the
        // direction of gravity is unknown and the heading is undefined.
        let norm = input_data.accel_mss.norm();
        report.accel_norm_mss = norm;

        if !(norm > 0.0) {
            return Err(HeadEstError::DegenerateAccel);
        }

        let accel = input_data.accel_mss / norm;

        // Recover the tilt angles from the direction of gravity
        let pitch_rad = (-accel.x).asin();
        let roll_rad = accel.y.atan2(accel.z);
        report.pitch_rad = pitch_rad;
        report.roll_rad = roll_rad;

        // Rotate the magnetic axes back into the horizontal plane
        let xh = mag.x * pitch_rad.cos() + mag.z * pitch_rad.sin();
        let yh = mag.x * roll_rad.sin() * pitch_rad.sin() + mag.y * roll_rad.cos()
            - mag.z * roll_rad.sin() * pitch_rad.cos();

        let heading_deg = coord::normalize_angle(yh.atan2(xh).to_degrees());

        Ok((heading_deg, report))
    }
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

    fn level_accel() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 9.81)
    }

    #[test]
    fn test_level_headings() {
        let mut est = HeadEst::from_params(Params::default());

        // Field along +x is north
        let (heading, _) = est
            .proc(&InputData {
                mag_raw: Vector3::new(1.0, 0.0, 0.0),
                accel_mss: level_accel(),
            })
            .unwrap();
        assert_close(heading, 0.0);

        // Field along +y is east
        let (heading, _) = est
            .proc(&InputData {
                mag_raw: Vector3::new(0.0, 1.0, 0.0),
                accel_mss: level_accel(),
            })
            .unwrap();
        assert_close(heading, 90.0);

        // Field along -x is south
        let (heading, _) = est
            .proc(&InputData {
                mag_raw: Vector3::new(-1.0, 0.0, 0.0),
                accel_mss: level_accel(),
            })
            .unwrap();
        assert_close(heading, 180.0);
    }

    #[test]
    fn test_pitch_does_not_swing_north_heading() {
        let mut est = HeadEst::from_params(Params::default());

        // Platform pitched such that gravity reads (-g/2, 0, g sqrt(3)/2),
        // with the horizontal field along body x only. The compensated
        // heading must still be north.
        let (heading, report) = est
            .proc(&InputData {
                mag_raw: Vector3::new(1.0, 0.0, 0.0),
                accel_mss: Vector3::new(-4.905, 0.0, 9.81 * 0.75f64.sqrt()),
            })
            .unwrap();

        assert_close(heading, 0.0);
        assert_close(report.pitch_rad, std::f64::consts::FRAC_PI_6);
        assert_close(report.roll_rad, 0.0);
    }

    #[test]
    fn test_hard_iron_offsets_removed() {
        let mut est = HeadEst::from_params(Params {
            mag_offset_x: 12.0,
            mag_offset_y: -3.5,
            mag_offset_z: 7.0,
            mag_declination_deg: 0.0,
        });

        let (heading, _) = est
            .proc(&InputData {
                mag_raw: Vector3::new(13.0, -3.5, 7.0),
                accel_mss: level_accel(),
            })
            .unwrap();

        // After offset removal the field is (1, 0, 0), due north
        assert_close(heading, 0.0);
    }

    #[test]
    fn test_zero_accel_is_degenerate() {
        let mut est = HeadEst::from_params(Params::default());

        let result = est.proc(&InputData {
            mag_raw: Vector3::new(1.0, 0.0, 0.0),
            accel_mss: Vector3::new(0.0, 0.0, 0.0),
        });

        assert!(matches!(result, Err(HeadEstError::DegenerateAccel)));
    }

    #[test]
    fn test_heading_in_range() {
        let mut est = HeadEst::from_params(Params::default());

        for i in 0..36 {
            let angle = (i as f64) * 10.0f64.to_radians();
            let (heading, _) = est
                .proc(&InputData {
                    mag_raw: Vector3::new(angle.cos(), angle.sin(), -0.3),
                    accel_mss: level_accel(),
                })
                .unwrap();

            assert!(
                (0.0..360.0).contains(&heading),
                "heading {} out of range",
                heading
            );
        }
    }
}
