//! # Equipment module
//!
//! Interfaces to the equipment the navigation loop depends on: the absolute
//! position source, the inertial and magnetic sensors, and the motor
//! driver. The core never talks to hardware directly, it consumes
//! already-parsed readings through these traits and emits abstract motion
//! commands into them.
//!
//! One implementation of each trait is selected once at startup from the
//! `eqpt.toml` parameters, there is no per-call branching on source kind.
//! Each handle is long lived and owned by the control loop.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal
pub use params::*;

use crate::nav_ctrl::NavCommand;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during equipment operation.
#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    /// A sensor read failed or timed out. Surfaced to the control loop,
    /// which decides whether to coast or stop, never silently replaced
    /// with zeros.
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Motor demand rejected: {0}")]
    MotorDemandRejected(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of absolute lat/lon position fixes.
pub trait PositionSource {
    /// Poll for a fix.
    ///
    /// `Ok(None)` means "no fix yet" and is not an error: the caller
    /// retries, with a bounded attempt budget at startup and rate limited
    /// retries during periodic resync.
    fn poll(&mut self) -> Result<Option<(f64, f64)>, EqptError>;
}

/// A 3-axis inertial (acceleration) source.
pub trait InertialSource {
    /// Read the current body frame acceleration, gravity inclusive.
    ///
    /// Units: meters/second^2
    fn read_accel(&mut self) -> Result<Vector3<f64>, EqptError>;
}

/// A 3-axis magnetic field source.
pub trait MagSource {
    /// Read the current raw magnetic field vector in the sensor frame.
    ///
    /// Units: raw sensor counts (any consistent fixed scale)
    fn read_mag(&mut self) -> Result<Vector3<f64>, EqptError>;
}

/// The motor driver sink for motion commands.
///
/// Implementations must be safe to call at the loop cadence: idempotent and
/// non-blocking or bounded latency.
pub trait MotorSink {
    /// Execute a motion command.
    fn exec(&mut self, cmd: &NavCommand) -> Result<(), EqptError>;

    /// Stop all motion. Always safe to call repeatedly.
    fn stop(&mut self) -> Result<(), EqptError> {
        self.exec(&NavCommand::Stop)
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The full set of equipment handles used by the control loop.
pub struct EqptSuite {
    pub pos: Box<dyn PositionSource>,
    pub imu: Box<dyn InertialSource>,
    pub mag: Box<dyn MagSource>,
    pub motors: Box<dyn MotorSink>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EqptSuite {
    /// Construct the suite selected by the parameters.
    pub fn from_params(params: &Params) -> Self {
        match params.suite {
            SuiteKind::Sim => Self {
                pos: Box::new(sim::SimPosition::from_params(params)),
                imu: Box::new(sim::SimInertial::from_params(params)),
                mag: Box::new(sim::SimMag::new()),
                motors: Box::new(sim::SimMotors::new()),
            },
        }
    }
}
