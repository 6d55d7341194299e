//! # Routine memory
//!
//! Named slots, each holding a pick and a place waypoint captured from the arm, and the batch
//! executor which runs the sequencer over them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod executor;
mod store;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::tc::SlotRole;

pub use executor::*;
pub use store::*;

use crate::sequencer::SequenceError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors from the routine memory and batch executor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutineError {
    #[error("Unknown slot {0:?}")]
    UnknownSlot(String),

    #[error("Slot {slot:?} is missing {missing:?}")]
    IncompleteSlot { slot: String, missing: Vec<SlotRole> },

    #[error("Slot {0:?} is defined more than once")]
    DuplicateSlot(String),

    #[error("Slot identifier {0:?} is not allowed")]
    InvalidSlotId(String),

    #[error("At least one slot must be defined")]
    NoSlots,

    #[error("Routine for slot {slot:?} failed: {source}")]
    Execution {
        slot: String,
        source: SequenceError,
    },
}
