//! Parameters structure for the equipment module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which equipment suite to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// Deterministic simulated equipment, used for development and tests.
    Sim,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for equipment selection and startup behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Which equipment suite to construct.
    pub suite: SuiteKind,

    /// Maximum number of absolute fix attempts during startup before
    /// navigation start is aborted.
    pub max_startup_fix_attempts: u32,

    /// Pause between startup fix attempts.
    ///
    /// Units: seconds
    pub startup_fix_retry_s: f64,

    // ---- SIM SUITE ----

    /// Latitude reported by the sim position source.
    ///
    /// Units: degrees
    pub sim_fix_lat_deg: f64,

    /// Longitude reported by the sim position source.
    ///
    /// Units: degrees
    pub sim_fix_lon_deg: f64,

    /// Number of polls the sim position source answers with "no fix yet"
    /// before producing fixes, modelling a cold start.
    pub sim_polls_until_fix: u32,

    /// Amplitude of the zero-mean accelerometer noise produced by the sim
    /// inertial source.
    ///
    /// Units: meters/second^2
    pub sim_accel_noise_mss: f64,
}
