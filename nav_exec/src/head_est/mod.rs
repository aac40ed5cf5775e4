//! # Heading estimation module
//!
//! Combines a raw 3-axis magnetic field reading with a gravity-inclusive
//! 3-axis acceleration reading to produce a tilt-compensated compass heading
//! in degrees, `[0, 360)`, 0° = north, clockwise positive.
//!
//! The acceleration vector gives the direction of gravity in the sensor
//! frame, from which pitch and roll are recovered. The magnetic axes are
//! then rotated back into the horizontal plane before the heading is taken,
//! so the heading stays accurate when the platform is not level.
//!
//! The estimate is recomputed fresh on every call with no internal
//! smoothing. Callers wanting a stable heading must window or filter
//! samples themselves.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during heading estimation.
#[derive(Debug, thiserror::Error)]
pub enum HeadEstError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    /// The acceleration vector has (near) zero magnitude so the direction of
    /// gravity, and therefore the tilt, is undefined. Surfaced as an error
    /// rather than letting NaN propagate into the heading.
    #[error("Acceleration vector magnitude is zero, heading is undefined")]
    DegenerateAccel,
}
