//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{NavCommand, NavCtrlError, Params, GRAVITY_MSS};
use crate::coord;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state.
///
/// The position and velocity estimate is owned exclusively by this struct
/// and mutated only by `proc` and `reset_position`.
#[derive(Default)]
pub struct NavCtrl {
    pub(crate) params: Params,

    /// Estimated east position in the local frame. Units: meters
    x_m: f64,

    /// Estimated north position in the local frame. Units: meters
    y_m: f64,

    /// Estimated east velocity. Units: meters/second
    vx_ms: f64,

    /// Estimated north velocity. Units: meters/second
    vy_ms: f64,

    /// Destination in the local frame, `None` until explicitly set.
    dest_m: Option<(f64, f64)>,

    /// Time of the last `proc` call, `None` before the first call.
    last_update_time_s: Option<f64>,

    /// Time of the last absolute position overwrite.
    last_resync_time_s: f64,

    report: StatusReport,

    output: Option<NavSnapshot>,
    arch_output: Archiver,
}

/// Input data for one navigation cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Wall clock time of this cycle, measured from the caller's epoch. The
    /// integration uses the measured difference between successive cycles,
    /// not the nominal update period, so variable loop timing is tolerated.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Body frame acceleration reading, gravity inclusive.
    ///
    /// Units: meters/second^2
    pub accel_mss: Vector3<f64>,

    /// Tilt compensated heading.
    ///
    /// Units: degrees, 0 = north, clockwise positive
    pub heading_deg: f64,
}

/// Snapshot of all quantities computed during one navigation cycle, written
/// to the telemetry archive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavSnapshot {
    /// Cycle time. Units: seconds
    pub time_s: f64,

    /// Estimated east position. Units: meters
    pub x_m: f64,

    /// Estimated north position. Units: meters
    pub y_m: f64,

    /// Estimated east velocity. Units: meters/second
    pub vx_ms: f64,

    /// Estimated north velocity. Units: meters/second
    pub vy_ms: f64,

    /// Bias corrected body x (forward) acceleration. Units: meters/second^2
    pub ax_body_mss: f64,

    /// Bias corrected body y (left) acceleration. Units: meters/second^2
    pub ay_body_mss: f64,

    /// Gravity corrected body z acceleration. Units: meters/second^2
    pub az_body_mss: f64,

    /// Earth frame east acceleration. Units: meters/second^2
    pub ax_earth_mss: f64,

    /// Earth frame north acceleration. Units: meters/second^2
    pub ay_earth_mss: f64,

    /// Heading used for the frame rotation. Units: degrees
    pub heading_deg: f64,

    /// Bearing to the destination, `None` if no destination is set or the
    /// destination coincides with the position estimate. Units: degrees
    pub target_bearing_deg: Option<f64>,

    /// Heading error, zero when the bearing is undefined. Units: degrees
    pub heading_error_deg: f64,

    /// Distance to the destination, infinite when unset. Units: meters
    pub dist_to_dest_m: f64,

    /// Command selected this cycle.
    pub cmd: &'static str,

    /// Normalised speed demand of the selected command.
    pub cmd_speed: f64,
}

/// Status report for NavCtrl processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// True when this cycle only seeded the integrator clock and produced no
    /// state update.
    pub seeded_clock: bool,

    /// Measured integration timestep. Units: seconds
    pub dt_s: f64,

    /// True if an absolute position resync is due.
    pub resync_due: bool,

    /// True if the destination has been reached.
    pub reached_dest: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for NavCtrl {
    type InitData = &'static str;
    type InitError = NavCtrlError;

    type InputData = InputData;
    type OutputData = Option<NavSnapshot>;
    type StatusReport = StatusReport;
    type ProcError = NavCtrlError;

    /// Initialise the NavCtrl module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data).map_err(NavCtrlError::ParamLoadError)?;
        self.params.validate()?;

        self.arch_output = Archiver::from_path(session, "nav_ctrl/snapshot.csv")
            .map_err(NavCtrlError::ArchInitError)?;

        info!(
            "NavCtrl initialised ({:.1} Hz, resync every {:.0} s)",
            self.params.update_freq_hz, self.params.resync_interval_s
        );

        Ok(())
    }

    /// Perform one dead reckoning update.
    ///
    /// The first call only seeds the integrator clock and yields no
    /// snapshot, since no timestep can be measured without a previous
    /// timestamp. Callers must skip using the output in that case.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();
        self.report.resync_due = self.should_resync(input_data.time_s);

        let last_time_s = match self.last_update_time_s {
            Some(t) => t,
            None => {
                self.last_update_time_s = Some(input_data.time_s);
                self.report.seeded_clock = true;
                self.report.reached_dest = self.has_reached_destination();
                return Ok((None, self.report));
            }
        };

        // Measured timestep, not the nominal period
        let dt_s = input_data.time_s - last_time_s;
        self.last_update_time_s = Some(input_data.time_s);
        self.report.dt_s = dt_s;

        // Remove gravity from the z axis and the calibration bias from x/y
        let ax_body_mss = input_data.accel_mss.x - self.params.accel_bias_x_mss;
        let ay_body_mss = input_data.accel_mss.y - self.params.accel_bias_y_mss;
        let az_body_mss = input_data.accel_mss.z - GRAVITY_MSS;

        // Rotate the acceleration into the earth frame
        let (ax_earth_mss, ay_earth_mss) =
            coord::body_to_earth(ax_body_mss, ay_body_mss, input_data.heading_deg);

        // Double integration: accel -> velocity -> position. The decay
        // factor keeps velocity bounded under constant noise.
        self.vx_ms = self.vx_ms * self.params.velocity_decay + ax_earth_mss * dt_s;
        self.vy_ms = self.vy_ms * self.params.velocity_decay + ay_earth_mss * dt_s;

        self.x_m += self.vx_ms * dt_s;
        self.y_m += self.vy_ms * dt_s;

        self.report.reached_dest = self.has_reached_destination();

        let cmd = self.navigation_command(input_data.heading_deg);

        let snapshot = NavSnapshot {
            time_s: input_data.time_s,
            x_m: self.x_m,
            y_m: self.y_m,
            vx_ms: self.vx_ms,
            vy_ms: self.vy_ms,
            ax_body_mss,
            ay_body_mss,
            az_body_mss,
            ax_earth_mss,
            ay_earth_mss,
            heading_deg: input_data.heading_deg,
            target_bearing_deg: self.bearing_to_destination(),
            heading_error_deg: self.heading_error(input_data.heading_deg),
            dist_to_dest_m: self.distance_to_destination(),
            cmd: cmd.as_str(),
            cmd_speed: cmd.speed(),
        };

        self.output = Some(snapshot);

        Ok((Some(snapshot), self.report))
    }
}

impl NavCtrl {
    /// Build a NavCtrl directly from a validated parameter struct. No
    /// telemetry archive is attached, used by tests and tooling.
    pub fn with_params(params: Params) -> Result<Self, NavCtrlError> {
        params.validate()?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// The active parameter set.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current position estimate `(x_m, y_m)`.
    pub fn position(&self) -> (f64, f64) {
        (self.x_m, self.y_m)
    }

    /// Current velocity estimate `(vx_ms, vy_ms)`.
    pub fn velocity(&self) -> (f64, f64) {
        (self.vx_ms, self.vy_ms)
    }

    /// Set the destination in local frame metres.
    ///
    /// The pair takes effect atomically, a concurrent command interface
    /// must hold its own lock around the call.
    pub fn set_destination(&mut self, x_m: f64, y_m: f64) {
        self.dest_m = Some((x_m, y_m));

        debug!(
            "Destination set: ({:.1}, {:.1}) m, distance {:.2} m",
            x_m,
            y_m,
            self.distance_to_destination()
        );
    }

    /// The current destination, `None` if unset.
    pub fn destination(&self) -> Option<(f64, f64)> {
        self.dest_m
    }

    /// Hard overwrite of the position estimate from an absolute fix.
    ///
    /// Velocity is zeroed to discard accumulated drift, and the resync time
    /// is stamped with `now_s`.
    pub fn reset_position(&mut self, x_m: f64, y_m: f64, now_s: f64) {
        self.x_m = x_m;
        self.y_m = y_m;
        self.vx_ms = 0.0;
        self.vy_ms = 0.0;
        self.last_resync_time_s = now_s;

        debug!("Position reset: ({:.2}, {:.2}) m", x_m, y_m);
    }

    /// Distance to the destination, positive infinity when no destination is
    /// set. Infinity never satisfies the arrival test.
    pub fn distance_to_destination(&self) -> f64 {
        match self.dest_m {
            Some((dest_x_m, dest_y_m)) => {
                coord::distance_2d(self.x_m, self.y_m, dest_x_m, dest_y_m)
            }
            None => f64::INFINITY,
        }
    }

    /// Bearing to the destination in degrees, `None` when no destination is
    /// set or the destination coincides exactly with the position estimate
    /// (the bearing is undefined at zero distance).
    pub fn bearing_to_destination(&self) -> Option<f64> {
        let (dest_x_m, dest_y_m) = self.dest_m?;

        if coord::distance_2d(self.x_m, self.y_m, dest_x_m, dest_y_m) == 0.0 {
            return None;
        }

        Some(coord::bearing_to_point(self.x_m, self.y_m, dest_x_m, dest_y_m))
    }

    /// Heading error in degrees, `(-180, 180]`, zero when the bearing to
    /// the destination is undefined. Positive means turn right.
    pub fn heading_error(&self, heading_deg: f64) -> f64 {
        match self.bearing_to_destination() {
            Some(bearing_deg) => coord::angle_difference(bearing_deg, heading_deg),
            None => 0.0,
        }
    }

    /// True if the position estimate is strictly within the arrival radius
    /// of the destination.
    pub fn has_reached_destination(&self) -> bool {
        self.distance_to_destination() < self.params.arrival_radius_m
    }

    /// True if the resync interval has elapsed since the last absolute
    /// position overwrite. Purely time triggered.
    pub fn should_resync(&self, now_s: f64) -> bool {
        now_s - self.last_resync_time_s > self.params.resync_interval_s
    }

    /// Select the motion command for the current state.
    ///
    /// Stop when no destination is set (safe default) or when the
    /// destination is reached. Point turn toward the target bearing when the
    /// heading error exceeds the tolerance, drive forward otherwise.
    pub fn navigation_command(&self, heading_deg: f64) -> NavCommand {
        if self.dest_m.is_none() {
            return NavCommand::Stop;
        }

        if self.has_reached_destination() {
            return NavCommand::Stop;
        }

        let error_deg = self.heading_error(heading_deg);

        if error_deg.abs() > self.params.heading_tolerance_deg {
            if error_deg > 0.0 {
                NavCommand::TurnRight(self.params.turn_speed)
            } else {
                NavCommand::TurnLeft(self.params.turn_speed)
            }
        } else {
            NavCommand::Forward(self.params.base_speed)
        }
    }
}

impl Archived for NavCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        // Telemetry absence must not affect navigation, skip silently when
        // no archive is attached or no snapshot exists yet
        if !self.arch_output.is_open() {
            return Ok(());
        }

        match self.output {
            Some(ref snapshot) => self.arch_output.serialise(snapshot),
            None => Ok(()),
        }
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
            update_freq_hz: 10.0,
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

    fn nav() -> NavCtrl {
        NavCtrl::with_params(test_params()).unwrap()
    }

    /// Stationary gravity-only reading
    fn still_accel() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, GRAVITY_MSS)
    }

    #[test]
    fn test_first_cycle_seeds_clock() {
        let mut nav = nav();

        let (output, report) = nav
            .proc(&InputData {
                time_s: 0.0,
                accel_mss: still_accel(),
                heading_deg: 0.0,
            })
            .unwrap();

        assert!(output.is_none());
        assert!(report.seeded_clock);
        assert_eq!(nav.position(), (0.0, 0.0));
    }

    #[test]
    fn test_forward_integration() {
        let mut nav = nav();

        nav.proc(&InputData {
            time_s: 0.0,
            accel_mss: still_accel(),
            heading_deg: 0.0,
        })
        .unwrap();

        // 1 m/s^2 forward while heading north for 0.1 s
        let (output, report) = nav
            .proc(&InputData {
                time_s: 0.1,
                accel_mss: Vector3::new(1.0, 0.0, GRAVITY_MSS),
                heading_deg: 0.0,
            })
            .unwrap();

        let snapshot = output.unwrap();
        assert!((report.dt_s - 0.1).abs() < 1e-12);

        // All of the acceleration maps north
        assert!(snapshot.ax_earth_mss.abs() < 1e-9);
        assert!((snapshot.ay_earth_mss - 1.0).abs() < 1e-9);

        let (vx_ms, vy_ms) = nav.velocity();
        assert!(vx_ms.abs() < 1e-9);
        assert!((vy_ms - 0.1).abs() < 1e-9);

        let (x_m, y_m) = nav.position();
        assert!(x_m.abs() < 1e-9);
        assert!((y_m - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_stationary_velocity_bounded() {
        let mut nav = nav();
        let dt_s = 0.1;
        let noise_mss = 0.01;

        // Constant residual bias of 0.01 m/s^2 on the forward axis. The
        // decayed integrator converges to noise*dt / (1 - decay), here
        // 0.05 m/s, rather than growing without bound.
        let bound_ms = noise_mss * dt_s / (1.0 - test_params().velocity_decay);

        for i in 0..500 {
            nav.proc(&InputData {
                time_s: i as f64 * dt_s,
                accel_mss: Vector3::new(noise_mss, 0.0, GRAVITY_MSS),
                heading_deg: 0.0,
            })
            .unwrap();

            let (vx_ms, vy_ms) = nav.velocity();
            let speed_ms = vx_ms.hypot(vy_ms);
            assert!(
                speed_ms <= bound_ms + 1e-9,
                "velocity {} exceeded bound {} at cycle {}",
                speed_ms,
                bound_ms,
                i
            );
        }
    }

    #[test]
    fn test_reset_position_zeroes_velocity() {
        let mut nav = nav();

        nav.proc(&InputData {
            time_s: 0.0,
            accel_mss: still_accel(),
            heading_deg: 0.0,
        })
        .unwrap();
        nav.proc(&InputData {
            time_s: 0.1,
            accel_mss: Vector3::new(2.0, 1.0, GRAVITY_MSS),
            heading_deg: 45.0,
        })
        .unwrap();

        let (vx_ms, vy_ms) = nav.velocity();
        assert!(vx_ms != 0.0 || vy_ms != 0.0);

        nav.reset_position(3.0, -4.0, 12.0);

        assert_eq!(nav.position(), (3.0, -4.0));
        assert_eq!(nav.velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_arrival_is_strict() {
        let mut nav = nav();

        // Exactly on the arrival radius is not reached
        nav.set_destination(1.5, 0.0);
        assert!(!nav.has_reached_destination());

        // Just inside is reached
        let mut nav = self::nav();
        nav.set_destination(1.499, 0.0);
        assert!(nav.has_reached_destination());
        assert_eq!(nav.navigation_command(0.0), NavCommand::Stop);
    }

    #[test]
    fn test_command_selection_against_tolerance() {
        // Destination bearing 100 deg from the origin
        let dest_x_m = 10.0 * 100.0f64.to_radians().sin();
        let dest_y_m = 10.0 * 100.0f64.to_radians().cos();

        // Tolerance 15 deg: a 20 deg error demands a right turn
        let mut nav = nav();
        nav.set_destination(dest_x_m, dest_y_m);
        assert!((nav.heading_error(80.0) - 20.0).abs() < 1e-9);
        assert_eq!(nav.navigation_command(80.0), NavCommand::TurnRight(0.3));

        // An error of -20 deg demands a left turn
        assert_eq!(nav.navigation_command(120.0), NavCommand::TurnLeft(0.3));

        // Tolerance 25 deg: the same 20 deg error is acceptable
        let mut params = test_params();
        params.heading_tolerance_deg = 25.0;
        let mut nav = NavCtrl::with_params(params).unwrap();
        nav.set_destination(dest_x_m, dest_y_m);
        assert_eq!(nav.navigation_command(80.0), NavCommand::Forward(0.5));
    }

    #[test]
    fn test_no_destination_is_safe() {
        let nav = nav();

        assert_eq!(nav.destination(), None);
        assert_eq!(nav.distance_to_destination(), f64::INFINITY);
        assert!(!nav.has_reached_destination());
        assert_eq!(nav.bearing_to_destination(), None);
        assert_eq!(nav.heading_error(123.0), 0.0);
        assert_eq!(nav.navigation_command(123.0), NavCommand::Stop);
    }

    #[test]
    fn test_destination_at_position_is_stop() {
        let mut nav = nav();
        nav.set_destination(0.0, 0.0);

        // Bearing is undefined at zero distance, the command falls back to
        // stop via the arrival test
        assert_eq!(nav.bearing_to_destination(), None);
        assert_eq!(nav.heading_error(90.0), 0.0);
        assert_eq!(nav.navigation_command(90.0), NavCommand::Stop);
    }

    #[test]
    fn test_resync_is_time_triggered() {
        let mut nav = nav();
        nav.reset_position(0.0, 0.0, 0.0);

        assert!(!nav.should_resync(29.9));
        // The trigger is strictly greater than the interval
        assert!(!nav.should_resync(30.0));
        assert!(nav.should_resync(30.1));

        // A resync restarts the interval
        nav.reset_position(0.0, 0.0, 30.1);
        assert!(!nav.should_resync(59.0));
        assert!(nav.should_resync(60.3));
    }

    #[test]
    fn test_stationary_loop_with_sim_eqpt() {
        use crate::coord::RefFrame;
        use crate::eqpt::{
            sim, InertialSource, MagSource, Params as EqptParams, PositionSource, SuiteKind,
        };
        use crate::head_est::{HeadEst, InputData as HeadInput, Params as HeadParams};

        let eqpt_params = EqptParams {
            suite: SuiteKind::Sim,
            max_startup_fix_attempts: 5,
            startup_fix_retry_s: 0.0,
            sim_fix_lat_deg: 33.7015,
            sim_fix_lon_deg: -117.7528,
            sim_polls_until_fix: 0,
            sim_accel_noise_mss: 0.02,
        };

        let mut pos = sim::SimPosition::from_params(&eqpt_params);
        let mut imu = sim::SimInertial::from_params(&eqpt_params);
        let mut mag = sim::SimMag::new();
        let mut head_est = HeadEst::from_params(HeadParams::default());

        // Arm the frame at the first fix
        let (lat0_deg, lon0_deg) = pos.poll().unwrap().unwrap();
        let mut frame = RefFrame::new();
        frame.set_origin(lat0_deg, lon0_deg).unwrap();

        let mut nav = nav();
        nav.reset_position(0.0, 0.0, 0.0);
        nav.set_destination(0.0, 10.0);

        // Run a stationary loop: the sim mag points north, the destination
        // is due north, so every produced command is forward
        for i in 0..50 {
            let accel_mss = imu.read_accel().unwrap();
            let mag_raw = mag.read_mag().unwrap();

            let (heading_deg, _) = head_est
                .proc(&HeadInput { mag_raw, accel_mss })
                .unwrap();

            let (output, _) = nav
                .proc(&InputData {
                    time_s: i as f64 * 0.02,
                    accel_mss,
                    heading_deg,
                })
                .unwrap();

            if let Some(snapshot) = output {
                assert!(snapshot.heading_error_deg.abs() < 1.0);
                assert_eq!(snapshot.cmd, "forward");
            }
        }

        // The stationary rover must not have integrated itself anywhere near
        // the destination
        let (x_m, y_m) = nav.position();
        assert!(x_m.hypot(y_m) < 0.1, "drifted to ({}, {})", x_m, y_m);
        assert!(!nav.has_reached_destination());

        // A resync from the same fix snaps the estimate back to the origin
        let (lat_deg, lon_deg) = pos.poll().unwrap().unwrap();
        let (x_m, y_m) = frame.latlon_to_xy(lat_deg, lon_deg).unwrap();
        nav.reset_position(x_m, y_m, 1.0);

        assert_eq!(nav.position(), (0.0, 0.0));
        assert_eq!(nav.velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_proc_reports_resync_due() {
        let mut nav = nav();
        nav.reset_position(0.0, 0.0, 0.0);

        let (_, report) = nav
            .proc(&InputData {
                time_s: 31.0,
                accel_mss: still_accel(),
                heading_deg: 0.0,
            })
            .unwrap();

        assert!(report.resync_due);
    }
}
