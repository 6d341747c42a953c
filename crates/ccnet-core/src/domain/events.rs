//! Semantic events reported in reply to POLL.

use serde::{Deserialize, Serialize};

/// Poll reply codes (byte 3) that the driver understands.
pub mod status {
    pub const CASSETTE_INITIALIZED: u8 = 0x13;
    pub const IDLING: u8 = 0x14;
    pub const ACCEPTING: u8 = 0x15;
    pub const STACKING: u8 = 0x17;
    pub const RETURNING: u8 = 0x18;
    pub const REJECTING: u8 = 0x1C;
    pub const DROP_CASSETTE_OUT_OF_POSITION: u8 = 0x42;
    pub const ESCROW_POSITION: u8 = 0x80;
    pub const BILL_STACKED: u8 = 0x81;
    pub const BILL_RETURNED: u8 = 0x82;
}

/// An event decoded from a non-idle poll reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollEvent {
    CassetteInitialized,
    Accepted,
    EscrowPosition,
    Stacked,
    /// A note was stacked into the cassette; the code is the raw note-type byte.
    BillStacked { note_code: u8 },
    Returning,
    BillReturned,
    Rejected,
    /// The drop cassette was removed or is out of position.
    CassetteRemoved,
}

impl PollEvent {
    /// Maps a poll reply code (and sub-code) to an event.
    ///
    /// Returns `None` for idling and for codes without an event, including a
    /// stacked-note reply that is missing its note-type byte.
    pub fn classify(code: u8, sub_code: Option<u8>) -> Option<PollEvent> {
        let event = match code {
            status::CASSETTE_INITIALIZED => PollEvent::CassetteInitialized,
            status::ACCEPTING => PollEvent::Accepted,
            status::STACKING => PollEvent::Stacked,
            status::RETURNING => PollEvent::Returning,
            status::DROP_CASSETTE_OUT_OF_POSITION => PollEvent::CassetteRemoved,
            status::ESCROW_POSITION => PollEvent::EscrowPosition,
            status::BILL_STACKED => PollEvent::BillStacked {
                note_code: sub_code?,
            },
            status::BILL_RETURNED => PollEvent::BillReturned,
            status::REJECTING => PollEvent::Rejected,
            _ => return None,
        };
        Some(event)
    }
}
