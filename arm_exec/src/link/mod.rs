//! # Arm Link
//!
//! This module provides the link to the arm controller board. A [`Connector`] knows how to open a
//! [`Channel`], and the [`Transport`] owns whichever channel is currently open, reopening it when a
//! send fails.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Serial port connector for the real board.
pub mod serial;

/// In-process simulated board.
pub mod sim;

mod transport;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

pub use transport::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An open, writable channel to the board. Dropping the channel closes it.
pub trait Channel {
    /// Write one complete frame to the board.
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}

/// Something which can open a [`Channel`] to the board.
pub trait Connector {
    type Channel: Channel;

    /// Open a new channel.
    fn open(&mut self) -> Result<Self::Channel, LinkError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur on the link.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("The link to the arm is not open")]
    NotConnected,

    #[error("Could not open {port}: {source}")]
    OpenError {
        port: String,
        source: serialport::Error,
    },

    #[error("Could not clear the output buffer: {0}")]
    ClearError(serialport::Error),

    #[error("Could not write to the arm: {0}")]
    WriteError(std::io::Error),

    #[error("Simulated link fault: {0}")]
    SimFault(&'static str),
}

/// What happened to a frame handed to [`Transport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Written on the open channel.
    Delivered,

    /// The first write failed, the link was reopened and the retry succeeded.
    DeliveredAfterReconnect,

    /// The link could not be reopened or the retry failed, the frame was lost.
    Dropped,
}

impl SendOutcome {
    /// Returns true if the frame reached the board.
    pub fn delivered(&self) -> bool {
        !matches!(self, SendOutcome::Dropped)
    }
}
