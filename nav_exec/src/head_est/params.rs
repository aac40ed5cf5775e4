//! Parameters structure for HeadEst

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for heading estimation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    /// Hard iron offset on the magnetometer x axis, subtracted from the raw
    /// reading before tilt compensation.
    ///
    /// Units: raw sensor counts
    pub mag_offset_x: f64,

    /// Hard iron offset on the magnetometer y axis.
    ///
    /// Units: raw sensor counts
    pub mag_offset_y: f64,

    /// Hard iron offset on the magnetometer z axis.
    ///
    /// Units: raw sensor counts
    pub mag_offset_z: f64,

    /// Local magnetic declination.
    ///
    /// Units: degrees
    ///
    /// Reserved: loaded from the parameter file but not applied by the
    /// heading algorithm.
    pub mag_declination_deg: f64,
}
