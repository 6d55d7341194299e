//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Length of the shoulder link (L1).
    ///
    /// Units: arm length units, the same units targets are given in.
    pub shoulder_link_len: f64,

    /// Length of the elbow link (L2).
    ///
    /// Units: arm length units.
    pub elbow_link_len: f64,

    // ---- LIFT ----
    /// Lift position in which the arm is fully raised and safe to traverse.
    ///
    /// Units: degrees
    pub lift_up_deg: i32,

    // ---- START UP ----
    /// Shoulder position at start up.
    ///
    /// Units: degrees
    pub home_shoulder_deg: i32,

    /// Elbow position at start up.
    ///
    /// Units: degrees
    pub home_elbow_deg: i32,
}

impl Params {
    /// Furthest reachable distance from the shoulder axis.
    pub fn max_reach(&self) -> f64 {
        self.shoulder_link_len + self.elbow_link_len
    }

    /// Closest reachable distance from the shoulder axis.
    pub fn min_reach(&self) -> f64 {
        (self.shoulder_link_len - self.elbow_link_len).abs()
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            shoulder_link_len: 8.5,
            elbow_link_len: 7.5,
            lift_up_deg: 180,
            home_shoulder_deg: 90,
            home_elbow_deg: 90,
        }
    }
}
