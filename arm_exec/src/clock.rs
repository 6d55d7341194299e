//! # Clock
//!
//! Every wait performed by the arm (link settle, step settle, pause between routines) goes
//! through a [`Clock`] so that sequencing can be checked without waiting on the wall clock.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use crate::link::sim::{SimEvent, SimLog};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of blocking waits.
pub trait Clock {
    /// Block for at least `duration`.
    fn sleep(&mut self, duration: Duration);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Clock backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

/// Clock which records each wait into a [`SimLog`] and returns immediately.
#[derive(Debug, Clone)]
pub struct SimClock {
    log: SimLog,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

impl SimClock {
    pub fn new(log: SimLog) -> Self {
        Self { log }
    }
}

impl Clock for SimClock {
    fn sleep(&mut self, duration: Duration) {
        self.log.push(SimEvent::Wait(duration));
    }
}
