//! Transport backed by a real serial port via the `serialport` crate.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, SerialPort, StopBits};
use tracing::debug;

use super::{Parity, PortSettings, Transport, TransportError};

/// Sync, address and length: enough to know how long the rest of the frame is.
const HEADER_LEN: usize = 3;

/// Serial-port implementation of [`Transport`].
#[derive(Default)]
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, settings: &PortSettings) -> Result<(), TransportError> {
        debug!(
            "opening {} at {} baud, {} data bits, {} stop bits, parity {:?}",
            settings.port_name,
            settings.baud_rate,
            settings.data_bits,
            settings.stop_bits,
            settings.parity
        );
        let port = serialport::new(settings.port_name.as_str(), settings.baud_rate)
            .data_bits(data_bits(settings.data_bits)?)
            .stop_bits(stop_bits(settings.stop_bits)?)
            .parity(parity(settings.parity))
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(settings.read_timeout_ms))
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the handle closes the OS file descriptor.
        if let Some(port) = self.port.take() {
            debug!("closing {}", port.name().unwrap_or_default());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        let mut frame = vec![0u8; HEADER_LEN];
        match port.read_exact(&mut frame) {
            Ok(()) => {}
            // Nothing (or only a fragment) arrived before the timeout: idle.
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let total = frame[2] as usize;
        if total > HEADER_LEN {
            frame.resize(total, 0);
            port.read_exact(&mut frame[HEADER_LEN..])?;
        }
        Ok(frame)
    }
}

fn data_bits(bits: u8) -> Result<DataBits, TransportError> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(TransportError::InvalidSettings(format!(
            "unsupported data bits: {other}"
        ))),
    }
}

fn stop_bits(bits: u8) -> Result<StopBits, TransportError> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(TransportError::InvalidSettings(format!(
            "unsupported stop bits: {other}"
        ))),
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}
