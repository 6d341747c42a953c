//! Frame encoding and decoding for the CCNET serial protocol.
//!
//! Wire format:
//! ```text
//! [sync:1][address:1][length:1][command:1][data:N][crc_lo:1][crc_hi:1]
//! ```
//! `length` counts every byte of the frame, so a frame without data is six
//! bytes long and the largest frame is 255 bytes (249 data bytes).
//!
//! # Inbound frames
//!
//! Validators answer a POLL with terse replies, and some transports hand back
//! only the first few bytes of a reply.  Decoding is therefore lenient by
//! default: anything of at least four bytes is accepted and the response code
//! is read from index 3.  [`ChecksumMode::Strict`] turns on full structural and
//! CRC validation for installations that want it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::command::Command;
use crate::protocol::crc::{checksum_bytes, crc16};

/// Synchronisation byte that starts every frame.
pub const SYNC: u8 = 0x02;

/// Peripheral address of a bill validator on the CCNET bus.
pub const BILL_VALIDATOR_ADDRESS: u8 = 0x03;

/// Bytes in a frame that are not data: sync, address, length, command, CRC×2.
pub const FRAME_OVERHEAD: usize = 6;

/// Largest data section that still fits the one-byte length field.
pub const MAX_DATA_LEN: usize = u8::MAX as usize - FRAME_OVERHEAD;

/// Fewest bytes a reply must carry to expose a response code.
pub const MIN_USABLE_LEN: usize = 4;

/// Errors produced by [`encode_frame`] and [`decode_frame`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The data section does not fit in a single frame.
    #[error("frame data too large: {len} bytes (max {})", MAX_DATA_LEN)]
    FrameTooLarge { len: usize },

    /// The reply is too short to carry a response code.  Validators send such
    /// replies while idle, so callers usually treat this as "nothing happened".
    #[error("short frame: {len} bytes")]
    ShortFrame { len: usize },

    /// Strict mode: the first byte is not [`SYNC`].
    #[error("bad sync byte: 0x{0:02X}")]
    BadSync(u8),

    /// Strict mode: the length byte disagrees with the number of bytes read.
    #[error("length mismatch: header says {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Strict mode: the trailing CRC does not match the frame contents.
    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },
}

/// How much validation [`decode_frame`] applies to inbound bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumMode {
    /// Trust the transport; only the minimum length is enforced.
    #[default]
    Lenient,
    /// Require a well-formed frame with a matching CRC.
    Strict,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sync: u8,
    pub address: u8,
    /// Length byte as received (not necessarily the buffer length in lenient mode).
    pub length: u8,
    /// Response code (byte 3).
    pub code: u8,
    pub data: Vec<u8>,
    /// Trailing CRC when the buffer is a complete frame.
    pub checksum: Option<u16>,
}

impl Frame {
    /// Response code at byte index 3.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Sub-code at byte index 4, if the reply carries one.
    pub fn sub_code(&self) -> Option<u8> {
        self.data.first().copied()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the wire bytes for `command` with the given data section.
///
/// # Errors
///
/// Returns [`FrameError::FrameTooLarge`] when `data` is longer than
/// [`MAX_DATA_LEN`].
///
/// # Examples
///
/// ```rust
/// use ccnet_core::protocol::{encode_frame, Command};
///
/// let bytes = encode_frame(Command::Reset, &[]).unwrap();
/// assert_eq!(bytes, vec![0x02, 0x03, 0x06, 0x30, 0x41, 0xB3]);
/// ```
pub fn encode_frame(command: Command, data: &[u8]) -> Result<Vec<u8>, FrameError> {
    if data.len() > MAX_DATA_LEN {
        return Err(FrameError::FrameTooLarge { len: data.len() });
    }

    let length = data.len() + FRAME_OVERHEAD;
    let mut buf = Vec::with_capacity(length);
    buf.push(SYNC);
    buf.push(BILL_VALIDATOR_ADDRESS);
    buf.push(length as u8);
    buf.push(command.opcode());
    buf.extend_from_slice(data);

    let crc = crc16(&buf);
    buf.extend_from_slice(&checksum_bytes(crc));
    Ok(buf)
}

/// Parses an inbound reply.
///
/// # Errors
///
/// Always returns [`FrameError::ShortFrame`] for fewer than four bytes.  In
/// [`ChecksumMode::Strict`] also returns the structural and CRC errors.
pub fn decode_frame(raw: &[u8], mode: ChecksumMode) -> Result<Frame, FrameError> {
    if raw.len() < MIN_USABLE_LEN {
        return Err(FrameError::ShortFrame { len: raw.len() });
    }

    if mode == ChecksumMode::Strict {
        validate_strict(raw)?;
    }

    let declared = raw[2] as usize;
    let complete = raw.len() >= FRAME_OVERHEAD && declared == raw.len();
    let (data, checksum) = if complete {
        let body_end = raw.len() - 2;
        let crc = u16::from_le_bytes([raw[body_end], raw[body_end + 1]]);
        (raw[MIN_USABLE_LEN..body_end].to_vec(), Some(crc))
    } else {
        (raw[MIN_USABLE_LEN..].to_vec(), None)
    };

    Ok(Frame {
        sync: raw[0],
        address: raw[1],
        length: raw[2],
        code: raw[3],
        data,
        checksum,
    })
}

/// Returns `true` when `raw` is a complete frame whose CRC matches its body.
pub fn has_valid_checksum(raw: &[u8]) -> bool {
    raw.len() >= FRAME_OVERHEAD && validate_strict(raw).is_ok()
}

// Callers guarantee at least MIN_USABLE_LEN bytes.
fn validate_strict(raw: &[u8]) -> Result<(), FrameError> {
    if raw[0] != SYNC {
        return Err(FrameError::BadSync(raw[0]));
    }
    let declared = raw[2] as usize;
    if declared != raw.len() || raw.len() < FRAME_OVERHEAD {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: raw.len(),
        });
    }
    let body_end = raw.len() - 2;
    let expected = crc16(&raw[..body_end]);
    let actual = u16::from_le_bytes([raw[body_end], raw[body_end + 1]]);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
