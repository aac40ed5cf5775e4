//! Motion commands issued by NavCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A discrete motion command for the locomotion equipment.
///
/// Speeds are normalised demands in `[0, 1]`. The command is a decision
/// derived fresh from the navigation state each cycle, not a state machine
/// with memory, and is always safe to reissue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NavCommand {
    /// Drive forward at the given normalised speed.
    Forward(f64),

    /// Point turn to the left (anticlockwise) at the given normalised speed.
    TurnLeft(f64),

    /// Point turn to the right (clockwise) at the given normalised speed.
    TurnRight(f64),

    /// Stop all motion.
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCommand {
    /// The normalised speed demand carried by the command. `Stop` is zero.
    pub fn speed(&self) -> f64 {
        match self {
            NavCommand::Forward(s) => *s,
            NavCommand::TurnLeft(s) => *s,
            NavCommand::TurnRight(s) => *s,
            NavCommand::Stop => 0.0,
        }
    }

    /// Flat name of the command, used in telemetry records.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavCommand::Forward(_) => "forward",
            NavCommand::TurnLeft(_) => "turn_left",
            NavCommand::TurnRight(_) => "turn_right",
            NavCommand::Stop => "stop",
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_speed() {
        assert_eq!(NavCommand::Forward(0.5).speed(), 0.5);
        assert_eq!(NavCommand::TurnLeft(0.3).speed(), 0.3);
        assert_eq!(NavCommand::Stop.speed(), 0.0);
    }
}
