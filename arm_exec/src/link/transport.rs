//! Reconnecting transport over a [`Connector`]

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, trace, warn};
use std::time::Duration;

use super::{Channel, Connector, LinkError, SendOutcome};
use crate::clock::Clock;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time the board needs after the channel opens before it accepts frames (the board resets when
/// the port is opened).
pub const LINK_SETTLE: Duration = Duration::from_secs(2);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Owner of the single channel to the board.
///
/// Any failed send triggers exactly one reconnect, and if that succeeds exactly one retry of the
/// same frame. A frame which still cannot be written is dropped and reported as
/// [`SendOutcome::Dropped`]; the next frame carries the full arm state so the board catches up.
pub struct Transport<C: Connector, K: Clock> {
    connector: C,

    channel: Option<C::Channel>,

    clock: K,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: Connector, K: Clock> Transport<C, K> {
    /// Create a new transport. No channel is opened until [`Transport::connect`] or the first send.
    pub fn new(connector: C, clock: K) -> Self {
        Self {
            connector,
            channel: None,
            clock,
        }
    }

    /// Returns true if a channel is currently open.
    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// (Re)open the channel, closing any channel which is already open.
    ///
    /// On success waits [`LINK_SETTLE`] before returning. Failures are logged and reported as
    /// `false`.
    pub fn connect(&mut self) -> bool {
        if self.channel.take().is_some() {
            debug!("Closed existing arm link");
        }

        match self.connector.open() {
            Ok(channel) => {
                self.clock.sleep(LINK_SETTLE);
                self.channel = Some(channel);
                info!("Arm link open");
                true
            }
            Err(e) => {
                warn!("Could not open the arm link: {}", e);
                false
            }
        }
    }

    /// Send a frame to the board, reconnecting once on failure.
    pub fn send(&mut self, bytes: &[u8]) -> SendOutcome {
        match self.write(bytes) {
            Ok(()) => return SendOutcome::Delivered,
            Err(e) => warn!("Send failed ({}), reconnecting...", e),
        }

        if !self.connect() {
            error!(
                "Reconnect failed, dropped frame {:?}",
                String::from_utf8_lossy(bytes)
            );
            return SendOutcome::Dropped;
        }

        match self.write(bytes) {
            Ok(()) => SendOutcome::DeliveredAfterReconnect,
            Err(e) => {
                error!(
                    "Retry after reconnect failed ({}), dropped frame {:?}",
                    e,
                    String::from_utf8_lossy(bytes)
                );
                SendOutcome::Dropped
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let channel = self.channel.as_mut().ok_or(LinkError::NotConnected)?;
        channel.write_frame(bytes)?;
        trace!("Sent {:?}", String::from_utf8_lossy(bytes));
        Ok(())
    }
}
