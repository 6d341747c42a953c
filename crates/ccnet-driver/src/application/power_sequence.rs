//! Power-up handshake and power-down.
//!
//! Power-up brings a freshly connected validator into the accepting state:
//!
//! ```text
//! POLL ─read─► ACK ─► RESET ─► ENABLE_BILL_TYPES(all) ─► GET_STATUS ─read─►
//! SET_SECURITY(none) ─read─► IDENTIFICATION ─► ACK ─► POLL ─read─► ACK
//! ```
//!
//! Every send and every status read is followed by the step delay.  When a
//! status read decodes a device condition, the condition is stored as the
//! session's last error, a NAK is sent and the sequence aborts.

use ccnet_core::{decode_error, Command, ErrorCondition};
use tracing::{debug, error, info};

use super::validator::{BillValidator, DriverError};
use crate::infrastructure::transport::Transport;

/// Bitmap enabling every bill type, escrow disabled.
const ENABLE_ALL_BILL_TYPES: [u8; 6] = [0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00];
/// High-security mode off for every bill type.
const SECURITY_NONE: [u8; 3] = [0x00; 3];
const POWER_DOWN_POLL_DATA: [u8; 6] = [0x00; 6];

impl<T: Transport> BillValidator<T> {
    /// Runs the power-up handshake.
    ///
    /// On success the validator is powered up and bill acceptance is enabled.
    ///
    /// # Errors
    ///
    /// - [`DriverError::NotConnected`] without any I/O when not connected.
    /// - [`DriverError::PowerUpFailed`] or [`DriverError::SecurityModeFailed`]
    ///   when a status check decodes a device condition.
    /// - [`DriverError::DeviceCommunication`] when the transport fails.
    pub fn power_up(&self) -> Result<(), DriverError> {
        if !self.lock_session().connected {
            return Err(DriverError::NotConnected);
        }
        info!("powering up bill validator");

        self.step(Command::Poll, &[])?;
        self.check_status(DriverError::PowerUpFailed)?;
        self.step(Command::Ack, &[])?;
        self.step(Command::Reset, &[])?;
        self.step(Command::EnableBillTypes, &ENABLE_ALL_BILL_TYPES)?;

        self.step(Command::GetStatus, &[])?;
        self.check_status(DriverError::PowerUpFailed)?;

        self.step(Command::SetSecurity, &SECURITY_NONE)?;
        self.check_status(DriverError::SecurityModeFailed)?;

        self.step(Command::Identification, &[])?;
        self.step(Command::Ack, &[])?;

        self.step(Command::Poll, &[])?;
        self.check_status(DriverError::PowerUpFailed)?;
        self.step(Command::Ack, &[])?;

        self.update_session(|s| {
            s.bill_enabled = true;
            s.powered_up = true;
        });
        debug!("bill_enabled = true, powered_up = true");
        info!("bill validator powered up");
        Ok(())
    }

    /// Resets the validator and marks it powered down.  Does nothing when not
    /// connected.
    pub fn power_down(&self) -> Result<(), DriverError> {
        if !self.lock_session().connected {
            debug!("power-down requested while not connected");
            return Ok(());
        }
        info!("powering down bill validator");

        self.step(Command::Reset, &[]).map_err(into_power_down)?;
        self.step(Command::Poll, &POWER_DOWN_POLL_DATA)
            .map_err(into_power_down)?;

        self.update_session(|s| s.powered_up = false);
        debug!("powered_up = false");
        Ok(())
    }

    /// Reads one status reply and fails with `failure` if it carries a
    /// device condition.
    fn check_status(
        &self,
        failure: fn(ErrorCondition) -> DriverError,
    ) -> Result<(), DriverError> {
        let reply = self.receive()?;
        self.pause();

        let Some(condition) = decode_error(&reply) else {
            return Ok(());
        };
        self.update_session(|s| s.last_error = condition);
        error!("validator reported {condition} during power-up");
        self.send(Command::Nak, &[])?;
        Err(failure(condition))
    }
}

fn into_power_down(err: DriverError) -> DriverError {
    match err {
        DriverError::DeviceCommunication(e) => DriverError::PowerDown(e),
        other => other,
    }
}
