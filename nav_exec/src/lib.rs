//! # Rover navigation library.
//!
//! This library allows other crates in the workspace, and the executable's
//! own test suite, to access the items defined inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Coordinate module - local planar frame, angle utilities and body to earth rotations
pub mod coord;

/// Data store - global state of the executable
pub mod data_store;

/// Equipment module - interfaces to position, inertial, magnetic and motor equipment
pub mod eqpt;

/// Heading estimation module - tilt compensated compass heading
pub mod head_est;

/// Navigation control module - dead reckoning integrator and motion command selection
pub mod nav_ctrl;
