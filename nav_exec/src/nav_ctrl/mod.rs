//! # Navigation control module
//!
//! Dead reckoning navigator. Owns the position and velocity estimate of the
//! rover in the local frame and converts navigation state into discrete
//! motion commands toward a destination point.
//!
//! Each cycle the module takes a body frame acceleration reading and a
//! tilt-compensated heading, rotates the acceleration into the earth frame,
//! and double-integrates it into velocity and position. Velocity is decayed
//! by a configurable factor every cycle, which models drag and keeps the
//! integrated velocity bounded under zero-mean accelerometer noise.
//!
//! Between inertial updates the estimate drifts, so the module also tracks
//! when the position was last overwritten from an absolute fix and reports
//! when a resync is due. A resync hard-overwrites the position and zeroes
//! the velocity.
//!
//! Command selection is a pure function of the current state: stop when the
//! destination is reached (or none is set), point turn when the heading
//! error exceeds the tolerance, drive forward otherwise. There is no
//! hysteresis around the tolerance, a heading error sitting exactly on the
//! boundary can chatter between a turn and forward on successive cycles.
//! This is a known limitation of the reference behaviour and is kept as is.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Standard gravity, subtracted from the body z axis acceleration before
/// integration.
///
/// Units: meters/second^2
pub const GRAVITY_MSS: f64 = 9.81;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Could not create the telemetry archive: {0}")]
    ArchInitError(util::archive::ArchiveError),
}
