//! Byte-stream transport to the validator.
//!
//! The driver needs very little from the serial line: open it with the right
//! framing parameters, write a frame, read a frame, close it.  The
//! [`Transport`] trait captures exactly that so the application layer can run
//! against a real port ([`serial::SerialTransport`]) or an in-memory script
//! ([`scripted::ScriptedTransport`]).
//!
//! All operations block.  A transport that needs bounded latency must apply
//! its own read timeout; the driver never times out on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod scripted;
pub mod serial;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The requested line parameters cannot be represented by the port.
    #[error("invalid port settings: {0}")]
    InvalidSettings(String),

    #[error("port is not open")]
    NotOpen,
}

/// Parity mode of the serial line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial line parameters used to open the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    /// OS device name, e.g. `/dev/ttyUSB0` or `COM3`.
    #[serde(default = "default_port_name")]
    pub port_name: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// 5 to 8.
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    /// 1 or 2.
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: Parity,
    /// Read timeout applied by the serial adapter.  A timed-out read is
    /// reported as an empty (idle) reply.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_port_name() -> String {
    if cfg!(target_os = "windows") {
        "COM1".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_data_bits() -> u8 {
    8
}
fn default_stop_bits() -> u8 {
    1
}
fn default_read_timeout_ms() -> u64 {
    1000
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            port_name: default_port_name(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: Parity::default(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl PortSettings {
    /// Settings for `port_name` with the CCNET defaults (9600 8N1).
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }
}

/// Trait abstracting the serial byte stream.
///
/// `read` returns one logical frame per call.  An empty or short buffer is a
/// legitimate answer (the validator had nothing to say) and is not an error.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Opens and configures the line.
    fn open(&mut self, settings: &PortSettings) -> Result<(), TransportError>;
    /// Closes the line and releases the OS handle.
    fn close(&mut self) -> Result<(), TransportError>;
    fn is_open(&self) -> bool;
    /// Writes one complete frame.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    /// Reads one reply frame.
    fn read(&mut self) -> Result<Vec<u8>, TransportError>;
}
