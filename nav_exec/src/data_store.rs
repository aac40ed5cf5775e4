//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::head_est;
use crate::nav_ctrl::{self, NavCommand};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the navigation executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive sensor read failures. The loop coasts on the
    /// previous command for a single failed cycle, beyond that it stops.
    pub num_consec_sensor_errors: u64,

    // HeadEst
    pub head_est: head_est::HeadEst,

    // NavCtrl
    pub nav_ctrl: nav_ctrl::NavCtrl,
    pub nav_ctrl_output: Option<nav_ctrl::NavSnapshot>,
    pub nav_ctrl_status_rpt: nav_ctrl::StatusReport,

    /// The last command issued to the motors
    pub last_cmd: Option<NavCommand>,
}
