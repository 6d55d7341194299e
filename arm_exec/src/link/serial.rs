//! # Serial link
//!
//! Connector for the controller board on a serial port.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serialport::{ClearBuffer, SerialPort};
use std::{io::Write, time::Duration};

use super::{Channel, Connector, LinkError};
use crate::params::SerialParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Opens the configured serial port.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    port: String,

    baud_rate: u32,

    timeout: Duration,
}

/// An open serial port. The port is closed when this is dropped.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SerialConnector {
    pub fn new(params: &SerialParams) -> Self {
        Self {
            port: params.port.clone(),
            baud_rate: params.baud_rate,
            timeout: Duration::from_millis(params.timeout_ms),
        }
    }
}

impl Connector for SerialConnector {
    type Channel = SerialChannel;

    fn open(&mut self) -> Result<Self::Channel, LinkError> {
        let port = serialport::new(&self.port, self.baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(|e| LinkError::OpenError {
                port: self.port.clone(),
                source: e,
            })?;

        Ok(SerialChannel { port })
    }
}

impl Channel for SerialChannel {
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        // Discard anything still queued so the board only ever sees the latest demand
        self.port
            .clear(ClearBuffer::Output)
            .map_err(LinkError::ClearError)?;

        self.port.write_all(bytes).map_err(LinkError::WriteError)?;
        self.port.flush().map_err(LinkError::WriteError)
    }
}
