//! Application layer of the driver.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the protocol engine in `ccnet_core`
//! (frames, error codes, the poll state machine) and the infrastructure
//! (the serial port, configuration files).
//!
//! Code in this layer:
//!
//! - **Orchestrates** protocol pieces to fulfil a goal ("bring the validator
//!   up", "report every stacked note").
//! - **Depends on the [`Transport`] trait** rather than a concrete port, so a
//!   scripted transport can stand in for hardware in tests.
//! - **Owns the session state** and hands out snapshots only.
//!
//! # Sub-modules
//!
//! - **`validator`** – The [`BillValidator`] handle: construction, connect and
//!   disconnect, queries, and the framed send/read helpers.
//!
//! - **`power_sequence`** – The power-up handshake and power-down.
//!
//! - **`poll_events`** – The blocking poll loop, `stop()`, and the
//!   [`ValidatorEvents`] consumer trait.
//!
//! [`Transport`]: crate::infrastructure::transport::Transport
//! [`BillValidator`]: validator::BillValidator
//! [`ValidatorEvents`]: poll_events::ValidatorEvents

pub mod poll_events;
pub mod power_sequence;
pub mod validator;
