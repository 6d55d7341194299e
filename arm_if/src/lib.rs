//! # Arm interface crate.
//!
//! Provides the interfaces shared between the arm executable and anything that drives it: the
//! line frame sent to the arm and the telecommands accepted by the executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands and their responses
pub mod tc;

/// Frame definitions for equipment (the arm controller board)
pub mod eqpt;
