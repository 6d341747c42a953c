//! Decoding of device failure reports.
//!
//! A validator reports trouble by placing a failure code at byte 3 of its
//! reply.  Code `0x47` ("generic failure") carries a second byte that names
//! the failing mechanism.  [`decode_error`] maps a raw reply onto the closed
//! [`ErrorCondition`] set and is total: it never panics, whatever the input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure and status conditions a validator can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCondition {
    /// Nothing has been reported in this session.
    #[default]
    NoError,
    IllegalCommand,
    DropCassetteFull,
    DropCassetteOutOfPosition,
    ValidatorJammed,
    DropCassetteJammed,
    Cheated,
    Pause,
    StackMotorFailure,
    TransportMotorSpeedFailure,
    TransportMotorFailure,
    AligningMotorFailure,
    InitialCassetteStatusFailure,
    OpticCanalFailure,
    MagneticCanalFailure,
    CapacitanceCanalFailure,
    GenericFailure,
}

impl ErrorCondition {
    /// Protocol name, e.g. `STACK_MOTOR_FAILURE`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCondition::NoError => "NONE",
            ErrorCondition::IllegalCommand => "ILLEGAL_COMMAND",
            ErrorCondition::DropCassetteFull => "DROP_CASSETTE_FULL",
            ErrorCondition::DropCassetteOutOfPosition => "DROP_CASSETTE_OUT_OF_POSITION",
            ErrorCondition::ValidatorJammed => "VALIDATOR_JAMMED",
            ErrorCondition::DropCassetteJammed => "DROP_CASSETTE_JAMMED",
            ErrorCondition::Cheated => "CHEATED",
            ErrorCondition::Pause => "PAUSE",
            ErrorCondition::StackMotorFailure => "STACK_MOTOR_FAILURE",
            ErrorCondition::TransportMotorSpeedFailure => "TRANSPORT_MOTOR_SPEED_FAILURE",
            ErrorCondition::TransportMotorFailure => "TRANSPORT_MOTOR_FAILURE",
            ErrorCondition::AligningMotorFailure => "ALIGNING_MOTOR_FAILURE",
            ErrorCondition::InitialCassetteStatusFailure => "INITIAL_CASSETTE_STATUS_FAILURE",
            ErrorCondition::OpticCanalFailure => "OPTIC_CANAL_FAILURE",
            ErrorCondition::MagneticCanalFailure => "MAGNETIC_CANAL_FAILURE",
            ErrorCondition::CapacitanceCanalFailure => "CAPACITANCE_CANAL_FAILURE",
            ErrorCondition::GenericFailure => "GENERIC_FAILURE",
        }
    }
}

impl fmt::Display for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Response code for a failure whose cause is given by the sub-code.
pub const GENERIC_FAILURE_CODE: u8 = 0x47;

/// Classifies a raw reply.
///
/// Returns `None` when the reply is not an error report at all, which is
/// distinct from [`ErrorCondition::NoError`].  Replies shorter than four bytes
/// carry no response code and are reported as [`ErrorCondition::GenericFailure`].
///
/// # Examples
///
/// ```rust
/// use ccnet_core::domain::device_error::{decode_error, ErrorCondition};
///
/// assert_eq!(decode_error(&[0x02, 0x03, 0x06, 0x00]), None);
/// assert_eq!(
///     decode_error(&[0x02, 0x03, 0x07, 0x47, 0x50]),
///     Some(ErrorCondition::StackMotorFailure)
/// );
/// ```
pub fn decode_error(raw: &[u8]) -> Option<ErrorCondition> {
    let Some(&code) = raw.get(3) else {
        return Some(ErrorCondition::GenericFailure);
    };

    let condition = match code {
        0x30 => ErrorCondition::IllegalCommand,
        0x41 => ErrorCondition::DropCassetteFull,
        0x42 => ErrorCondition::DropCassetteOutOfPosition,
        0x43 => ErrorCondition::ValidatorJammed,
        0x44 => ErrorCondition::DropCassetteJammed,
        0x45 => ErrorCondition::Cheated,
        0x46 => ErrorCondition::Pause,
        GENERIC_FAILURE_CODE => decode_failure_cause(raw.get(4).copied()),
        _ => return None,
    };
    Some(condition)
}

fn decode_failure_cause(sub_code: Option<u8>) -> ErrorCondition {
    match sub_code {
        Some(0x50) => ErrorCondition::StackMotorFailure,
        Some(0x51) => ErrorCondition::TransportMotorSpeedFailure,
        Some(0x52) => ErrorCondition::TransportMotorFailure,
        Some(0x53) => ErrorCondition::AligningMotorFailure,
        Some(0x54) => ErrorCondition::InitialCassetteStatusFailure,
        Some(0x55) => ErrorCondition::OpticCanalFailure,
        Some(0x56) => ErrorCondition::MagneticCanalFailure,
        Some(0x5F) => ErrorCondition::CapacitanceCanalFailure,
        _ => ErrorCondition::GenericFailure,
    }
}
