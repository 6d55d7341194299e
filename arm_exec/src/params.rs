//! # Arm Executable Parameters
//!
//! This module provides the parameters for the arm executable, loaded from `arm_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{arm_ctrl, routine::BatchPolicy};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Top level parameters. Every section and field may be omitted to get its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmExecParams {
    pub serial: SerialParams,

    pub arm: arm_ctrl::Params,

    pub routine: RoutineParams,
}

/// Serial link to the controller board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialParams {
    /// Device path or name of the serial port
    pub port: String,

    pub baud_rate: u32,

    /// Read/write timeout of the port.
    ///
    /// Units: milliseconds
    pub timeout_ms: u64,
}

/// Routine memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineParams {
    /// Slot identifiers, in the order `run all` executes them
    pub slots: Vec<String>,

    /// How `run all` treats slots missing a waypoint
    pub batch_policy: BatchPolicy,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyUSB0"),
            baud_rate: 115200,
            timeout_ms: 1000,
        }
    }
}

impl Default for RoutineParams {
    fn default() -> Self {
        Self {
            slots: vec!["1".into(), "2".into(), "3".into()],
            batch_policy: BatchPolicy::default(),
        }
    }
}
