//! The bill validator handle.
//!
//! [`BillValidator`] owns a [`Transport`] and the [`SessionState`] of one
//! connection.  All methods take `&self`, so one validator can be shared via
//! `Arc` between the thread running the poll loop and the thread that
//! eventually calls `stop()`.
//!
//! # Locking
//!
//! The transport and the session sit behind two separate mutexes.  The
//! transport lock is held for exactly one write or one read; the session lock
//! is never held across I/O or a sleep.  Both hold plain data, so a poisoned
//! lock is recovered rather than propagated.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use ccnet_core::{
    encode_frame, ChecksumMode, Command, ErrorCondition, FrameError, LifecycleState,
    SessionState,
};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::infrastructure::config::ProtocolConfig;
use crate::infrastructure::transport::{PortSettings, Transport, TransportError};

/// Pause after every command and every status read.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(528);

/// Error type for driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The serial port could not be opened or configured.
    #[error("failed to open port: {0}")]
    Port(#[source] TransportError),

    #[error("failed to close port: {0}")]
    Disconnect(#[source] TransportError),

    #[error("validator is not connected")]
    NotConnected,

    /// A status check during power-up decoded a device condition.
    #[error("power-up failed: device reported {0}")]
    PowerUpFailed(ErrorCondition),

    #[error("security mode could not be set: device reported {0}")]
    SecurityModeFailed(ErrorCondition),

    /// The operation is not allowed in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("device communication failed: {0}")]
    DeviceCommunication(#[from] TransportError),

    /// The device answered, but not with the expected response code.
    #[error("unexpected reply: expected code 0x{expected:02X}, got {}", describe_code(.actual))]
    UnexpectedReply { expected: u8, actual: Option<u8> },

    #[error("power-down failed: {0}")]
    PowerDown(#[source] TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl DriverError {
    /// Whether this error belongs to the device-communication category.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            DriverError::DeviceCommunication(_) | DriverError::UnexpectedReply { .. }
        )
    }
}

fn describe_code(code: &Option<u8>) -> String {
    match code {
        Some(code) => format!("0x{code:02X}"),
        None => "a short reply".to_string(),
    }
}

// ── Validator handle ──────────────────────────────────────────────────────────

/// Driver for one CCNET bill validator.
pub struct BillValidator<T: Transport> {
    transport: Mutex<T>,
    session: Mutex<SessionState>,
    step_delay: Duration,
    checksum_mode: ChecksumMode,
}

/// Builder for [`BillValidator`].
///
/// ```rust
/// use std::time::Duration;
/// use ccnet_driver::BillValidator;
/// use ccnet_driver::infrastructure::transport::scripted::ScriptedTransport;
///
/// let validator = BillValidator::builder(ScriptedTransport::new())
///     .step_delay(Duration::ZERO)
///     .build();
/// assert!(!validator.session().connected);
/// ```
pub struct BillValidatorBuilder<T: Transport> {
    transport: T,
    session: SessionState,
    step_delay: Duration,
    checksum_mode: ChecksumMode,
}

impl<T: Transport> BillValidatorBuilder<T> {
    /// Starts from an explicit session instead of the disconnected default.
    pub fn session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    /// Applies the timing and checksum settings of a loaded configuration.
    pub fn protocol(self, config: &ProtocolConfig) -> Self {
        self.step_delay(config.step_delay())
            .checksum_mode(config.checksum_mode())
    }

    pub fn build(self) -> BillValidator<T> {
        BillValidator {
            transport: Mutex::new(self.transport),
            session: Mutex::new(self.session),
            step_delay: self.step_delay,
            checksum_mode: self.checksum_mode,
        }
    }
}

impl<T: Transport> BillValidator<T> {
    /// Creates a disconnected validator with the default timing.
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: T) -> BillValidatorBuilder<T> {
        BillValidatorBuilder {
            transport,
            session: SessionState::default(),
            step_delay: DEFAULT_STEP_DELAY,
            checksum_mode: ChecksumMode::default(),
        }
    }

    // ── Connection ────────────────────────────────────────────────────────

    /// Opens and configures the port.
    pub fn connect(&self, settings: &PortSettings) -> Result<(), DriverError> {
        info!("connecting to {}", settings.port_name);
        self.lock_transport().open(settings).map_err(|e| {
            error!("could not open {}: {e}", settings.port_name);
            DriverError::Port(e)
        })?;
        self.update_session(|s| s.connected = true);
        debug!("connected = true");
        Ok(())
    }

    /// Closes the port and resets the session.  Calling it when not connected
    /// does nothing.
    pub fn disconnect(&self) -> Result<(), DriverError> {
        let connected = self.lock_session().connected;
        if !connected {
            debug!("disconnect requested while not connected");
            return Ok(());
        }

        {
            let mut transport = self.lock_transport();
            if transport.is_open() {
                transport.close().map_err(|e| {
                    error!("could not close port: {e}");
                    DriverError::Disconnect(e)
                })?;
            } else {
                warn!("port was already closed");
            }
        }

        *self.lock_session() = SessionState::default();
        info!("disconnected");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Snapshot of the session state.
    pub fn session(&self) -> SessionState {
        self.lock_session().clone()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lock_session().lifecycle()
    }

    /// Note-type codes stacked during the current polling session, in order.
    pub fn inserted_banknotes(&self) -> Vec<u8> {
        self.lock_session().accepted_notes.clone()
    }

    pub fn last_error(&self) -> ErrorCondition {
        self.lock_session().last_error
    }

    pub fn is_bill_enabled(&self) -> bool {
        self.lock_session().bill_enabled
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn checksum_mode(&self) -> ChecksumMode {
        self.checksum_mode
    }

    // ── Framed I/O helpers ────────────────────────────────────────────────

    /// Encodes and writes one command frame.
    pub(crate) fn send(&self, command: Command, data: &[u8]) -> Result<(), DriverError> {
        let frame = encode_frame(command, data)?;
        debug!("--> {command} {data:02X?}");
        self.lock_transport().write(&frame).map_err(|e| {
            error!("write of {command} failed: {e}");
            DriverError::DeviceCommunication(e)
        })
    }

    /// Reads one reply frame.
    pub(crate) fn receive(&self) -> Result<Vec<u8>, DriverError> {
        let raw = self.lock_transport().read().map_err(|e| {
            error!("read failed: {e}");
            DriverError::DeviceCommunication(e)
        })?;
        trace!("<-- {raw:02X?}");
        Ok(raw)
    }

    /// Sends a command, then waits the step delay.
    pub(crate) fn step(&self, command: Command, data: &[u8]) -> Result<(), DriverError> {
        self.send(command, data)?;
        self.pause();
        Ok(())
    }

    pub(crate) fn pause(&self) {
        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }
    }

    pub(crate) fn lock_session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn update_session<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock_session())
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
