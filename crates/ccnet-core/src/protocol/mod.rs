//! Protocol module containing the command table, CRC, and the frame codec.

pub mod command;
pub mod crc;
pub mod frame;

pub use command::Command;
pub use crc::crc16;
pub use frame::{decode_frame, encode_frame, ChecksumMode, Frame, FrameError};
