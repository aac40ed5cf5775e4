//! Parameters structure for NavCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::NavCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation control.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    // ---- TIMING ----

    /// Target navigation update frequency.
    ///
    /// Units: hertz
    pub update_freq_hz: f64,

    /// Interval between absolute position resyncs.
    ///
    /// Units: seconds
    pub resync_interval_s: f64,

    // ---- THRESHOLDS ----

    /// Distance below which the destination counts as reached.
    ///
    /// Units: meters
    pub arrival_radius_m: f64,

    /// Acceptable heading error before a point turn is commanded.
    ///
    /// Units: degrees
    pub heading_tolerance_deg: f64,

    // ---- INTEGRATION ----

    /// Per-cycle velocity decay factor, in `(0, 1]`. Models drag and keeps
    /// the integrated velocity bounded under accelerometer noise.
    pub velocity_decay: f64,

    /// Accelerometer bias on the body x axis, subtracted before integration.
    ///
    /// Units: meters/second^2
    pub accel_bias_x_mss: f64,

    /// Accelerometer bias on the body y axis, subtracted before integration.
    ///
    /// Units: meters/second^2
    pub accel_bias_y_mss: f64,

    // ---- SPEEDS ----

    /// Normalised forward drive speed, in `[0, 1]`.
    pub base_speed: f64,

    /// Normalised point turn speed, in `[0, 1]`.
    pub turn_speed: f64,

    // ---- RESERVED ----

    /// Estimated drift above which a resync would be forced.
    ///
    /// Units: meters
    ///
    /// Reserved: resync is currently purely time triggered, this knob is
    /// loaded but not read by the resync decision.
    pub drift_resync_threshold_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the numeric ranges of the parameter set.
    pub fn validate(&self) -> Result<(), NavCtrlError> {
        if !(self.update_freq_hz > 0.0) {
            return Err(NavCtrlError::InvalidParam(format!(
                "update_freq_hz must be positive, got {}",
                self.update_freq_hz
            )));
        }

        if !(self.resync_interval_s > 0.0) {
            return Err(NavCtrlError::InvalidParam(format!(
                "resync_interval_s must be positive, got {}",
                self.resync_interval_s
            )));
        }

        if !(self.arrival_radius_m > 0.0) {
            return Err(NavCtrlError::InvalidParam(format!(
                "arrival_radius_m must be positive, got {}",
                self.arrival_radius_m
            )));
        }

        if !(self.heading_tolerance_deg > 0.0) {
            return Err(NavCtrlError::InvalidParam(format!(
                "heading_tolerance_deg must be positive, got {}",
                self.heading_tolerance_deg
            )));
        }

        if !(self.velocity_decay > 0.0 && self.velocity_decay <= 1.0) {
            return Err(NavCtrlError::InvalidParam(format!(
                "velocity_decay must be in (0, 1], got {}",
                self.velocity_decay
            )));
        }

        for &(name, speed) in &[("base_speed", self.base_speed), ("turn_speed", self.turn_speed)]
        {
            if !(0.0..=1.0).contains(&speed) {
                return Err(NavCtrlError::InvalidParam(format!(
                    "{} must be in [0, 1], got {}",
                    name, speed
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> Params {
        Params {
            update_freq_hz: 50.0,
            resync_interval_s: 30.0,
            arrival_radius_m: 1.5,
            heading_tolerance_deg: 15.0,
            velocity_decay: 0.98,
            accel_bias_x_mss: 0.0,
            accel_bias_y_mss: 0.0,
            base_speed: 0.5,
            turn_speed: 0.3,
            drift_resync_threshold_m: 5.0,
        }
    }

    #[test]
    fn test_valid_params_pass() {
        valid_params().validate().unwrap();
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = valid_params();
        params.velocity_decay = 1.5;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.velocity_decay = 0.0;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.update_freq_hz = 0.0;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.base_speed = 1.2;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.turn_speed = -0.1;
        assert!(params.validate().is_err());
    }
}
