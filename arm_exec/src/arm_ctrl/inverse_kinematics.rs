//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use util::maths::wrap_deg_360;

// Internal imports
use super::{ArmCtrlError, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint angles produced by the inverse kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JointAngles {
    /// Units: degrees, in [0, 360)
    pub shoulder_deg: i32,

    /// Units: degrees, in [0, 360)
    pub elbow_deg: i32,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform the inverse kinematics calculations.
///
/// Inverse kinematics is described in
/// https://en.wikipedia.org/wiki/Inverse_kinematics. For a planar two link arm
/// the elbow angle follows from the law of cosines on the triangle formed by
/// the two links and the line to the target, and the shoulder angle is the
/// bearing of the target minus the angle the elbow link adds.
///
/// Only the elbow-down solution (non-negative elbow angle) is ever produced.
/// Angles are truncated towards zero to whole degrees and wrapped into
/// [0, 360).
pub fn calc_inverse_kinematics(
    params: &Params,
    x: f64,
    y: f64,
) -> Result<JointAngles, ArmCtrlError> {
    let l1 = params.shoulder_link_len;
    let l2 = params.elbow_link_len;

    let r = x.hypot(y);
    let max_r = params.max_reach();
    let min_r = params.min_reach();

    // NaN targets fail the finiteness check rather than slipping through both comparisons
    if !r.is_finite() || r > max_r || r < min_r {
        return Err(ArmCtrlError::Unreachable {
            x,
            y,
            r,
            min_r,
            max_r,
        });
    }

    // Clamp absorbs rounding at the edge of the workspace, acos is undefined outside [-1, 1]
    let cos_elbow = ((r.powi(2) - l1.powi(2) - l2.powi(2)) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
    let elbow_rad = cos_elbow.acos();
    let shoulder_rad =
        y.atan2(x) - (l2 * elbow_rad.sin()).atan2(l1 + l2 * elbow_rad.cos());

    debug!(
        "IK ({}, {}): shoulder {:.4} rad, elbow {:.4} rad",
        x, y, shoulder_rad, elbow_rad
    );

    Ok(JointAngles {
        shoulder_deg: wrap_deg_360(shoulder_rad.to_degrees() as i32),
        elbow_deg: wrap_deg_360(elbow_rad.to_degrees() as i32),
    })
}
