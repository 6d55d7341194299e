//! # Arm library.
//!
//! Motion core of the pick-and-place arm: kinematics, the arm state and its link to the
//! controller board, the pick-and-place sequencer and the routine memory.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - kinematics, arm state and the frame encoder
pub mod arm_ctrl;

/// Time source used for every settle delay
pub mod clock;

/// Data store - owns the arm controller and the routine memory
pub mod data_store;

/// Link to the arm controller board, serial or simulated
pub mod link;

/// Executable parameters
pub mod params;

/// Routine memory and batch execution
pub mod routine;

/// Pick-and-place motion sequencer
pub mod sequencer;

/// Telecommand processor - maps telecommands onto the data store
pub mod tc_processor;
