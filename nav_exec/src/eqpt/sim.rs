//! Simulated equipment suite
//!
//! Deterministic stand-ins for the real equipment, modelling a stationary
//! rover: the position source reports a fixed lat/lon after a configurable
//! cold start, the inertial source reads gravity plus zero-mean alternating
//! noise, and the magnetic source reads a constant north-pointing field
//! with a downward dip component.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;

// Internal
use super::{EqptError, InertialSource, MagSource, MotorSink, Params, PositionSource};
use crate::nav_ctrl::NavCommand;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gravity read by the sim accelerometer when the rover is level.
///
/// Units: meters/second^2
const SIM_GRAVITY_MSS: f64 = 9.81;

/// Magnetic field read by the sim magnetometer, pointing north with a
/// typical mid-latitude downward dip.
///
/// Units: raw sensor counts
const SIM_MAG_FIELD: [f64; 3] = [420.0, 0.0, -310.0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sim absolute position source.
pub struct SimPosition {
    lat_deg: f64,
    lon_deg: f64,
    polls_until_fix: u32,
    num_polls: u32,
}

/// Sim inertial source.
pub struct SimInertial {
    noise_mss: f64,
    num_reads: u32,
}

/// Sim magnetic source.
#[derive(Default)]
pub struct SimMag;

/// Sim motor driver, records the last executed command.
#[derive(Default)]
pub struct SimMotors {
    last_cmd: Option<NavCommand>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimPosition {
    pub fn from_params(params: &Params) -> Self {
        Self {
            lat_deg: params.sim_fix_lat_deg,
            lon_deg: params.sim_fix_lon_deg,
            polls_until_fix: params.sim_polls_until_fix,
            num_polls: 0,
        }
    }
}

impl PositionSource for SimPosition {
    fn poll(&mut self) -> Result<Option<(f64, f64)>, EqptError> {
        self.num_polls += 1;

        // Model a cold start: no fix for the first few polls
        if self.num_polls <= self.polls_until_fix {
            return Ok(None);
        }

        Ok(Some((self.lat_deg, self.lon_deg)))
    }
}

impl SimInertial {
    pub fn from_params(params: &Params) -> Self {
        Self {
            noise_mss: params.sim_accel_noise_mss,
            num_reads: 0,
        }
    }
}

impl InertialSource for SimInertial {
    fn read_accel(&mut self) -> Result<Vector3<f64>, EqptError> {
        self.num_reads += 1;

        // Zero-mean noise: the sign alternates every read
        let noise_mss = if self.num_reads % 2 == 0 {
            self.noise_mss
        } else {
            -self.noise_mss
        };

        Ok(Vector3::new(noise_mss, -noise_mss, SIM_GRAVITY_MSS))
    }
}

impl SimMag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MagSource for SimMag {
    fn read_mag(&mut self) -> Result<Vector3<f64>, EqptError> {
        Ok(Vector3::new(
            SIM_MAG_FIELD[0],
            SIM_MAG_FIELD[1],
            SIM_MAG_FIELD[2],
        ))
    }
}

impl SimMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last executed command, `None` before the first one.
    pub fn last_cmd(&self) -> Option<NavCommand> {
        self.last_cmd
    }
}

impl MotorSink for SimMotors {
    fn exec(&mut self, cmd: &NavCommand) -> Result<(), EqptError> {
        // Saturate the demand the way a PWM driver would
        let speed = clamp(&cmd.speed(), &0.0, &1.0);

        trace!("SimMotors: {} at {:.2}", cmd.as_str(), speed);

        self.last_cmd = Some(*cmd);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> Params {
        Params {
            suite: super::super::SuiteKind::Sim,
            max_startup_fix_attempts: 5,
            startup_fix_retry_s: 0.0,
            sim_fix_lat_deg: 33.7015,
            sim_fix_lon_deg: -117.7528,
            sim_polls_until_fix: 2,
            sim_accel_noise_mss: 0.02,
        }
    }

    #[test]
    fn test_sim_position_cold_start() {
        let mut pos = SimPosition::from_params(&test_params());

        // No fix for the configured number of polls, then a fix
        assert_eq!(pos.poll().unwrap(), None);
        assert_eq!(pos.poll().unwrap(), None);
        assert_eq!(pos.poll().unwrap(), Some((33.7015, -117.7528)));
        assert_eq!(pos.poll().unwrap(), Some((33.7015, -117.7528)));
    }

    #[test]
    fn test_sim_inertial_noise_is_zero_mean() {
        let mut imu = SimInertial::from_params(&test_params());

        let mut sum = Vector3::zeros();
        for _ in 0..10 {
            sum += imu.read_accel().unwrap();
        }

        assert!(sum.x.abs() < 1e-12);
        assert!(sum.y.abs() < 1e-12);
        assert!((sum.z - 10.0 * SIM_GRAVITY_MSS).abs() < 1e-9);
    }

    #[test]
    fn test_sim_motors_idempotent_stop() {
        let mut motors = SimMotors::new();

        motors.exec(&NavCommand::Forward(0.5)).unwrap();
        assert_eq!(motors.last_cmd(), Some(NavCommand::Forward(0.5)));

        // Stop can be issued repeatedly without error
        motors.stop().unwrap();
        motors.stop().unwrap();
        assert_eq!(motors.last_cmd(), Some(NavCommand::Stop));
    }
}
