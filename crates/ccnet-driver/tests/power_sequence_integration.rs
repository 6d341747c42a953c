//! Integration tests for the connection lifecycle and power-up handshake.
//!
//! # Purpose
//!
//! These tests drive a [`BillValidator`] through its public API against a
//! [`ScriptedTransport`], the same way the monitor binary drives a real port.
//! They verify:
//!
//! - The happy path: connect, power up, power down, disconnect.
//! - The exact frames of the handshake, including data sections and CRCs.
//! - The failure paths: a device condition during the security step, and
//!   operations attempted before connecting.
//!
//! # Handshake at a glance
//!
//! ```text
//! Host                                   Validator
//! ────                                   ─────────
//! POLL                         ───►
//!                              ◄───      status (must not be an error)
//! ACK, RESET, ENABLE_BILL_TYPES ───►
//! GET_STATUS                   ───►
//!                              ◄───      status
//! SET_SECURITY                 ───►
//!                              ◄───      status
//! IDENTIFICATION, ACK, POLL    ───►
//!                              ◄───      status
//! ACK                          ───►
//! ```

use std::time::Duration;

use ccnet_core::{encode_frame, Command, ErrorCondition, LifecycleState, SessionState};
use ccnet_driver::infrastructure::transport::scripted::ScriptedTransport;
use ccnet_driver::{BillValidator, DriverError, PortSettings, Transport};

/// A well-formed ACK reply from the validator.
const ACK_REPLY: [u8; 6] = [0x02, 0x03, 0x06, 0x00, 0xC2, 0x82];

fn fast_validator(transport: &ScriptedTransport) -> BillValidator<ScriptedTransport> {
    BillValidator::builder(transport.clone())
        .step_delay(Duration::ZERO)
        .build()
}

fn failure_reply(sub_code: u8) -> Vec<u8> {
    let mut raw = vec![0x02, 0x03, 0x07, 0x47, sub_code];
    raw.extend_from_slice(&ccnet_core::protocol::crc::crc16(&raw).to_le_bytes());
    raw
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[test]
fn test_full_lifecycle_against_scripted_port() {
    // Arrange
    let transport = ScriptedTransport::new();
    transport.set_fallback_reply(ACK_REPLY);
    let validator = fast_validator(&transport);

    // Act / Assert – connect
    validator.connect(&PortSettings::new("/dev/ttyUSB0")).unwrap();
    assert_eq!(validator.lifecycle(), LifecycleState::Connected);

    // Act / Assert – power up
    validator.power_up().unwrap();
    assert_eq!(validator.lifecycle(), LifecycleState::Enabled);
    assert_eq!(transport.write_count(), 10);
    assert_eq!(transport.read_count(), 4);

    // Act / Assert – power down
    validator.power_down().unwrap();
    assert_eq!(validator.lifecycle(), LifecycleState::Connected);
    assert_eq!(transport.write_count(), 12);

    // Act / Assert – disconnect
    validator.disconnect().unwrap();
    assert_eq!(validator.session(), SessionState::default());
    assert!(!transport.is_open());
}

#[test]
fn test_handshake_frames_are_exact() {
    // Arrange
    let transport = ScriptedTransport::opened();
    transport.set_fallback_reply(ACK_REPLY);
    let validator = BillValidator::builder(transport.clone())
        .session(SessionState {
            connected: true,
            ..SessionState::default()
        })
        .step_delay(Duration::ZERO)
        .build();

    // Act
    validator.power_up().unwrap();

    // Assert
    let steps: [(Command, &[u8]); 10] = [
        (Command::Poll, &[]),
        (Command::Ack, &[]),
        (Command::Reset, &[]),
        (Command::EnableBillTypes, &[0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00]),
        (Command::GetStatus, &[]),
        (Command::SetSecurity, &[0x00, 0x00, 0x00]),
        (Command::Identification, &[]),
        (Command::Ack, &[]),
        (Command::Poll, &[]),
        (Command::Ack, &[]),
    ];
    let expected: Vec<Vec<u8>> = steps
        .into_iter()
        .map(|(command, data)| encode_frame(command, data).unwrap())
        .collect();
    assert_eq!(transport.written(), expected);
    assert_eq!(transport.written()[0], vec![0x02, 0x03, 0x06, 0x33, 0xDA, 0x81]);
    assert_eq!(transport.written()[2], vec![0x02, 0x03, 0x06, 0x30, 0x41, 0xB3]);
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[test]
fn test_security_failure_stops_after_nak() {
    // Arrange
    let transport = ScriptedTransport::new();
    transport.push_replies([ACK_REPLY.to_vec(), ACK_REPLY.to_vec(), failure_reply(0x50)]);
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();

    // Act
    let result = validator.power_up();

    // Assert
    assert!(matches!(
        result,
        Err(DriverError::SecurityModeFailed(ErrorCondition::StackMotorFailure))
    ));
    assert_eq!(transport.write_count(), 7);
    assert_eq!(transport.read_count(), 3);
    assert_eq!(transport.written_commands().last(), Some(&0xFF));
    assert_eq!(validator.last_error(), ErrorCondition::StackMotorFailure);
    assert_eq!(validator.lifecycle(), LifecycleState::Connected);
}

#[test]
fn test_get_status_failure_is_power_up_failure() {
    let transport = ScriptedTransport::new();
    transport.push_replies([ACK_REPLY.to_vec(), failure_reply(0x55)]);
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();

    let result = validator.power_up();

    assert!(matches!(
        result,
        Err(DriverError::PowerUpFailed(ErrorCondition::OpticCanalFailure))
    ));
    assert_eq!(
        transport.written_commands(),
        vec![0x33, 0x00, 0x30, 0x34, 0x31, 0xFF]
    );
}

#[test]
fn test_power_up_before_connect_does_no_io() {
    let transport = ScriptedTransport::new();
    let validator = fast_validator(&transport);

    assert!(matches!(validator.power_up(), Err(DriverError::NotConnected)));
    assert_eq!(transport.write_count(), 0);
    assert_eq!(transport.read_count(), 0);
}

#[test]
fn test_open_failure_leaves_validator_disconnected() {
    let transport = ScriptedTransport::new();
    transport.fail_open(true);
    let validator = fast_validator(&transport);

    let result = validator.connect(&PortSettings::default());

    assert!(matches!(result, Err(DriverError::Port(_))));
    assert_eq!(validator.lifecycle(), LifecycleState::Disconnected);
}

#[test]
fn test_write_failure_mid_handshake_is_communication_error() {
    let transport = ScriptedTransport::new();
    transport.set_fallback_reply(ACK_REPLY);
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();
    transport.fail_writes(true);

    let err = validator.power_up().unwrap_err();

    assert!(err.is_communication());
    assert!(!validator.session().powered_up);
}

// ── Disconnect ────────────────────────────────────────────────────────────────

#[test]
fn test_disconnect_is_idempotent() {
    let transport = ScriptedTransport::new();
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();

    validator.disconnect().unwrap();
    validator.disconnect().unwrap();

    assert_eq!(validator.lifecycle(), LifecycleState::Disconnected);
}

#[test]
fn test_disconnect_after_port_vanished_still_resets_state() {
    // Arrange
    let transport = ScriptedTransport::new();
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();
    transport.force_closed();
    transport.fail_close(true);

    // Act – close is never attempted on an already-closed port.
    let result = validator.disconnect();

    // Assert
    assert!(result.is_ok());
    assert_eq!(validator.lifecycle(), LifecycleState::Disconnected);
}

#[test]
fn test_power_down_failure_is_reported() {
    let transport = ScriptedTransport::new();
    let validator = fast_validator(&transport);
    validator.connect(&PortSettings::default()).unwrap();
    transport.fail_writes(true);

    assert!(matches!(validator.power_down(), Err(DriverError::PowerDown(_))));
}
