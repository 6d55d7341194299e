//! Arm control module

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod forward_kinematics;
mod inverse_kinematics;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::tc::JointField;
use std::ops::RangeInclusive;

// Internal
pub use forward_kinematics::*;
pub use inverse_kinematics::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The elbow servo is mounted reversed, the board expects `ELBOW_MIRROR_DEG - elbow`.
pub const ELBOW_MIRROR_DEG: i32 = 180;

/// Range of joint demands accepted from manual control.
///
/// Units: degrees
pub const MANUAL_JOINT_RANGE_DEG: RangeInclusive<i32> = -360..=720;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArmCtrlError {
    #[error(
        "Target ({x}, {y}) is out of reach: distance {r:.2} is outside [{min_r:.2}, {max_r:.2}]"
    )]
    Unreachable {
        x: f64,
        y: f64,
        r: f64,
        min_r: f64,
        max_r: f64,
    },

    #[error("Invalid value {value} for {field}")]
    InvalidValue { field: JointField, value: i32 },
}
