//! Domain logic for a bill-validator session.
//!
//! Everything here is pure: no serial ports, no threads, no sleeping.  The
//! driver crate owns the I/O and feeds bytes into these types.
//!
//! - **`device_error`** – decodes failure reports into [`device_error::ErrorCondition`].
//! - **`events`** – maps poll reply codes to [`events::PollEvent`]s.
//! - **`session`** – the flags and note ledger of one connection.
//! - **`poll_machine`** – the polling loop as a step-driven state machine.

pub mod device_error;
pub mod events;
pub mod poll_machine;
pub mod session;
