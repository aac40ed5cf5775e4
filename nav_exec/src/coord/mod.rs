//! # Coordinate module
//!
//! Geometry used by the navigation system:
//!
//! - A local planar frame anchored at a single lat/lon origin, with
//!   conversions between lat/lon and local east/north metres
//!   (flat earth approximation).
//! - Rotation of body frame (forward/left) accelerations into the earth
//!   frame (east/north).
//! - Angle normalisation, shortest signed angular difference, 2D distance
//!   and bearing.
//!
//! Headings and bearings are measured in degrees clockwise from north, so
//! 0° = north and 90° = east.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frame;
mod transform;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use frame::*;
pub use transform::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Metres per degree of latitude, approximately constant everywhere.
///
/// Units: meters/degree
pub const M_PER_DEG_LAT: f64 = 110_540.0;

/// Metres per degree of longitude at the equator. Scaled by the cosine of
/// the origin latitude when a frame is armed.
///
/// Units: meters/degree
pub const M_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during coordinate operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    /// The frame origin has already been armed. The origin is set exactly
    /// once per session, at the first valid absolute fix.
    #[error("The local frame origin has already been set")]
    OriginAlreadySet,

    /// A conversion was requested before the frame origin was armed.
    #[error("No local frame origin has been set")]
    NoOrigin,
}
