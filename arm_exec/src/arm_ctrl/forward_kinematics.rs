//! Arm forward kinematics, used to report where manual moves put the end effector

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::round_dp;

use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of decimal places positions are reported to.
pub const POSITION_DP: i32 = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position of the end effector relative to the shoulder axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndEffectorPos {
    /// Units: arm length units
    pub x: f64,

    /// Units: arm length units
    pub y: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the end effector position for the given joint angles, rounded to
/// [`POSITION_DP`] decimal places.
pub fn calc_forward_kinematics(params: &Params, shoulder_deg: i32, elbow_deg: i32) -> EndEffectorPos {
    let l1 = params.shoulder_link_len;
    let l2 = params.elbow_link_len;
    let t1 = (shoulder_deg as f64).to_radians();
    let t12 = t1 + (elbow_deg as f64).to_radians();

    EndEffectorPos {
        x: round_dp(l1 * t1.cos() + l2 * t12.cos(), POSITION_DP),
        y: round_dp(l1 * t1.sin() + l2 * t12.sin(), POSITION_DP),
    }
}
