//! # Simulated arm link
//!
//! A stand-in for the controller board which records everything sent to it. The same
//! [`SimLog`] can be shared with a [`crate::clock::SimClock`] so that frames and waits appear
//! in a single ordered history.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::eqpt::ArmFrame;
use log::debug;
use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use super::{Channel, Connector, LinkError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared, ordered record of everything that happened on a simulated link.
#[derive(Debug, Clone, Default)]
pub struct SimLog {
    inner: Rc<RefCell<SimLogInner>>,
}

#[derive(Debug, Default)]
struct SimLogInner {
    events: VecDeque<SimEvent>,

    /// Oldest events are discarded beyond this many, unbounded if `None`
    max_events: Option<usize>,

    /// Number of upcoming opens to refuse
    failing_opens: usize,

    /// Number of upcoming writes to refuse
    failing_writes: usize,
}

/// Connector to the simulated board.
#[derive(Debug, Clone)]
pub struct SimConnector {
    log: SimLog,
}

/// Open channel to the simulated board.
#[derive(Debug)]
pub struct SimChannel {
    log: SimLog,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single entry in a [`SimLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Opened,
    OpenFailed,
    Closed,
    Frame(String),
    WriteFailed(String),
    Wait(Duration),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log which only keeps the newest `max_events` events.
    pub fn bounded(max_events: usize) -> Self {
        let log = Self::default();
        log.inner.borrow_mut().max_events = Some(max_events);
        log
    }

    pub fn push(&self, event: SimEvent) {
        self.inner.borrow_mut().push(event);
    }

    /// Copy of every event still held.
    pub fn events(&self) -> Vec<SimEvent> {
        self.inner.borrow().events.iter().cloned().collect()
    }

    /// Every frame successfully written, decoded.
    ///
    /// Lines which are not valid frames are skipped.
    pub fn frames(&self) -> Vec<ArmFrame> {
        self.inner
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Frame(line) => line.parse().ok(),
                _ => None,
            })
            .collect()
    }

    /// Every wait recorded by a [`crate::clock::SimClock`].
    pub fn waits(&self) -> Vec<Duration> {
        self.inner
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Wait(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Total simulated time spent waiting.
    pub fn total_wait(&self) -> Duration {
        self.waits().iter().sum()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().events.clear();
    }

    /// Refuse the next `n` open attempts.
    pub fn fail_next_opens(&self, n: usize) {
        self.inner.borrow_mut().failing_opens = n;
    }

    /// Refuse the next `n` writes.
    pub fn fail_next_writes(&self, n: usize) {
        self.inner.borrow_mut().failing_writes = n;
    }
}

impl SimLogInner {
    fn push(&mut self, event: SimEvent) {
        self.events.push_back(event);
        if let Some(max) = self.max_events {
            while self.events.len() > max {
                self.events.pop_front();
            }
        }
    }
}

impl SimConnector {
    pub fn new(log: SimLog) -> Self {
        Self { log }
    }
}

impl Connector for SimConnector {
    type Channel = SimChannel;

    fn open(&mut self) -> Result<Self::Channel, LinkError> {
        let mut inner = self.log.inner.borrow_mut();

        if inner.failing_opens > 0 {
            inner.failing_opens -= 1;
            inner.push(SimEvent::OpenFailed);
            return Err(LinkError::SimFault("open refused"));
        }

        inner.push(SimEvent::Opened);
        Ok(SimChannel {
            log: self.log.clone(),
        })
    }
}

impl Channel for SimChannel {
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let line = String::from_utf8_lossy(bytes).into_owned();
        let mut inner = self.log.inner.borrow_mut();

        if inner.failing_writes > 0 {
            inner.failing_writes -= 1;
            inner.push(SimEvent::WriteFailed(line));
            return Err(LinkError::SimFault("write refused"));
        }

        debug!("Sim arm <- {:?}", line);
        inner.push(SimEvent::Frame(line));
        Ok(())
    }
}

impl Drop for SimChannel {
    fn drop(&mut self) {
        self.log.push(SimEvent::Closed);
    }
}
