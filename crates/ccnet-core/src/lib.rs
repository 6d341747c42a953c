//! # ccnet-core
//!
//! Protocol engine for CCNET bill validators (CashCode and compatible units)
//! that talk to a host over a serial line.
//!
//! This crate has no I/O of its own.  It is shared by the driver and by any
//! tooling that needs to build or inspect CCNET frames.
//!
//! # Architecture overview
//!
//! - **`protocol`** – How bytes travel over the serial line.  Commands are
//!   wrapped in a frame (`sync, address, length, command, data, crc16`), and
//!   replies are parsed back into a [`Frame`].
//!
//! - **`domain`** – What the bytes mean.  Failure reports decode into an
//!   [`ErrorCondition`], poll replies into a [`PollEvent`], and the polling
//!   loop itself is expressed as the [`PollMachine`] state machine operating
//!   on a [`SessionState`].

pub mod domain;
pub mod protocol;

pub use domain::device_error::{decode_error, ErrorCondition};
pub use domain::events::PollEvent;
pub use domain::poll_machine::{PollAction, PollMachine, PollReply};
pub use domain::session::{LifecycleState, SessionState};
pub use protocol::command::Command;
pub use protocol::frame::{decode_frame, encode_frame, ChecksumMode, Frame, FrameError};
