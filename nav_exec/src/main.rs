//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and all modules
//!     - Acquire the first absolute fix and arm the local frame origin
//!     - Main loop:
//!         - Sensor acquisition (inertial + magnetic)
//!         - Heading estimation
//!         - Dead reckoning position update
//!         - Periodic absolute position resync
//!         - Motion command selection and motor execution
//!         - Telemetry archiving
//!         - Cycle timing management
//!
//! The loop runs at the configured navigation update frequency. Each cycle
//! measures its own elapsed time and sleeps the remainder, so the
//! integration timestep is measured wall clock time rather than the nominal
//! period.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use nav_lib::{
    coord::RefFrame,
    data_store::DataStore,
    eqpt::{self, EqptSuite},
    head_est, nav_ctrl,
    nav_ctrl::NavCommand,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::{Archived, Archiver},
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum interval between position source polls while a resync is due.
///
/// Units: seconds
const RESYNC_POLL_MIN_INTERVAL_S: f64 = 1.0;

/// Number of consecutive sensor failures tolerated before the motors are
/// stopped. A single failed cycle coasts on the previous command.
const MAX_SENSOR_ERROR_GRACE: u64 = 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Row of the lat/lon pose archive, the position estimate converted back
/// through the local frame origin.
#[derive(Serialize)]
struct PoseRecord {
    time_s: f64,
    lat_deg: f64,
    lon_deg: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Wayfarer Rover Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- DESTINATION FROM CLI ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 3 {
        return Err(eyre!(
            "Expected two arguments (destination east and north in metres), found {}",
            args.len() - 1
        ));
    }

    let dest_x_m: f64 = args[1]
        .parse()
        .wrap_err("Could not parse the destination east coordinate")?;
    let dest_y_m: f64 = args[2]
        .parse()
        .wrap_err("Could not parse the destination north coordinate")?;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.nav_ctrl
        .init("nav_ctrl.toml", &session)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    ds.head_est
        .init("head_est.toml", &session)
        .wrap_err("Failed to initialise HeadEst")?;
    info!("HeadEst init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE EQUIPMENT ----

    let eqpt_params: eqpt::Params =
        util::params::load("eqpt.toml").wrap_err("Could not load equipment params")?;

    let mut eqpt = EqptSuite::from_params(&eqpt_params);
    info!("Equipment suite initialised: {:?}", eqpt_params.suite);

    // ---- ACQUIRE REFERENCE ORIGIN ----

    // Without an absolute fix there is no origin and the local coordinates
    // are meaningless, so exhausting the attempt budget is fatal.
    let mut fix = None;

    for attempt in 1..=eqpt_params.max_startup_fix_attempts {
        match eqpt
            .pos
            .poll()
            .wrap_err("Failed to poll the position source")?
        {
            Some(f) => {
                fix = Some(f);
                break;
            }
            None => {
                info!(
                    "No absolute fix yet (attempt {}/{})",
                    attempt, eqpt_params.max_startup_fix_attempts
                );
                thread::sleep(Duration::from_secs_f64(eqpt_params.startup_fix_retry_s));
            }
        }
    }

    let (lat0_deg, lon0_deg) = fix.ok_or_else(|| {
        eyre!(
            "No absolute fix within {} attempts, cannot establish the reference origin",
            eqpt_params.max_startup_fix_attempts
        )
    })?;

    let mut frame = RefFrame::new();
    frame.set_origin(lat0_deg, lon0_deg)?;

    info!("Reference origin: {:.6}, {:.6}", lat0_deg, lon0_deg);

    // The navigation clock starts now, with the rover at the local origin
    let epoch = Instant::now();
    ds.nav_ctrl.reset_position(0.0, 0.0, 0.0);
    ds.nav_ctrl.set_destination(dest_x_m, dest_y_m);

    info!(
        "Destination: ({:.1}, {:.1}) m, distance {:.2} m\n",
        dest_x_m,
        dest_y_m,
        ds.nav_ctrl.distance_to_destination()
    );

    // Pose archive, the estimate converted back to lat/lon
    let mut pose_arch = Archiver::from_path(&session, "nav_ctrl/pose_latlon.csv")
        .wrap_err("Failed to create the pose archive")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period_s = 1.0 / ds.nav_ctrl.params().update_freq_hz;
    let cycles_per_second = ds.nav_ctrl.params().update_freq_hz.round().max(1.0) as u128;

    let mut last_resync_poll_s = 0.0f64;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let now_s = epoch.elapsed().as_secs_f64();

        // ---- SENSOR ACQUISITION ----

        let readings = match (eqpt.imu.read_accel(), eqpt.mag.read_mag()) {
            (Ok(accel_mss), Ok(mag_raw)) => Some((accel_mss, mag_raw)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Sensor read failed: {}", e);
                None
            }
        };

        // ---- HEADING ESTIMATION ----

        let nav_input = readings.and_then(|(accel_mss, mag_raw)| {
            match ds.head_est.proc(&head_est::InputData { mag_raw, accel_mss }) {
                Ok((heading_deg, _)) => Some(nav_ctrl::InputData {
                    time_s: now_s,
                    accel_mss,
                    heading_deg,
                }),
                Err(e) => {
                    warn!("Heading estimation failed: {}", e);
                    None
                }
            }
        });

        match nav_input {
            Some(input) => {
                ds.num_consec_sensor_errors = 0;

                // ---- NAVIGATION PROCESSING ----

                match ds.nav_ctrl.proc(&input) {
                    Ok((output, report)) => {
                        ds.nav_ctrl_output = output;
                        ds.nav_ctrl_status_rpt = report;
                    }
                    Err(e) => warn!("Error during NavCtrl processing: {}", e),
                }

                // ---- ABSOLUTE POSITION RESYNC ----

                // Resync is time triggered, and while one is due the
                // position source is polled at most once per
                // RESYNC_POLL_MIN_INTERVAL_S until a fix arrives.
                if ds.nav_ctrl_status_rpt.resync_due
                    && now_s - last_resync_poll_s >= RESYNC_POLL_MIN_INTERVAL_S
                {
                    last_resync_poll_s = now_s;

                    match eqpt.pos.poll() {
                        Ok(Some((lat_deg, lon_deg))) => {
                            let (x_m, y_m) = frame.latlon_to_xy(lat_deg, lon_deg)?;
                            ds.nav_ctrl.reset_position(x_m, y_m, now_s);
                            info!("Position resynced to ({:.2}, {:.2}) m", x_m, y_m);
                        }
                        Ok(None) => debug!("Resync due but no fix available yet"),
                        Err(e) => warn!("Resync poll failed: {}", e),
                    }
                }

                // ---- COMMAND SELECTION & EXECUTION ----

                let cmd = ds.nav_ctrl.navigation_command(input.heading_deg);

                if let Err(e) = eqpt.motors.exec(&cmd) {
                    warn!("Motor command failed: {}", e);
                }
                ds.last_cmd = Some(cmd);

                // ---- TELEMETRY ----

                if let Err(e) = ds.nav_ctrl.write() {
                    warn!("Could not write the NavCtrl archive: {}", e);
                }

                if let Some(ref snapshot) = ds.nav_ctrl_output {
                    if let Ok((lat_deg, lon_deg)) = frame.xy_to_latlon(snapshot.x_m, snapshot.y_m)
                    {
                        if let Err(e) = pose_arch.serialise(PoseRecord {
                            time_s: snapshot.time_s,
                            lat_deg,
                            lon_deg,
                        }) {
                            warn!("Could not write the pose archive: {}", e);
                        }
                    }
                }

                // 1 Hz progress report
                if ds.num_cycles % cycles_per_second == 0 {
                    if let Some(ref snapshot) = ds.nav_ctrl_output {
                        info!(
                            "Pos: ({:.2}, {:.2}) m | Dist: {:.2} m | HErr: {:.1} deg | Cmd: {}",
                            snapshot.x_m,
                            snapshot.y_m,
                            snapshot.dist_to_dest_m,
                            snapshot.heading_error_deg,
                            snapshot.cmd
                        );
                    }
                }

                // ---- ARRIVAL ----

                if ds.nav_ctrl.has_reached_destination() {
                    eqpt.motors.stop().wrap_err("Failed to stop the motors")?;
                    ds.last_cmd = Some(NavCommand::Stop);

                    info!(
                        "Destination reached at ({:.2}, {:.2}) m, navigation complete",
                        ds.nav_ctrl.position().0,
                        ds.nav_ctrl.position().1
                    );
                    break;
                }
            }
            None => {
                // ---- SENSOR FAILURE POLICY ----

                ds.num_consec_sensor_errors += 1;

                // One cycle of grace coasting on the previous command, then
                // fail safe by stopping
                if ds.num_consec_sensor_errors > MAX_SENSOR_ERROR_GRACE {
                    warn!(
                        "Sensor failure persisting ({} cycles), stopping motors",
                        ds.num_consec_sensor_errors
                    );

                    if let Err(e) = eqpt.motors.stop() {
                        warn!("Could not stop the motors: {}", e);
                    }
                    ds.last_cmd = Some(NavCommand::Stop);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
