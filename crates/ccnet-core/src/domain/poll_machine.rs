//! Step-driven state machine for the polling loop.
//!
//! The machine performs no I/O and never sleeps.  It tells its driver what to
//! do next through [`PollAction`]s, and the driver reports each reply back via
//! [`PollMachine::on_reply`].  This keeps the loop independent of the
//! scheduling model: a blocking thread, an async task, or an event-loop
//! callback can all drive it.
//!
//! One iteration of the loop looks like this:
//!
//! ```text
//! Send(POLL) → Delay → Read ──on_reply──► Delay ─┬─ idle / short ─────────────► (next iteration)
//!                                                ├─ event ──► Notify ─► Send(ACK) → Delay ─►
//!                                                ├─ unknown code ─────► Send(ACK) → Delay ─►
//!                                                └─ corrupted (strict) ► Send(NAK) → Delay ─►
//! ```
//!
//! The `enabled` flag is only consulted at the start of an iteration, so a
//! stop request takes effect at the next loop boundary.

use tracing::trace;

use crate::domain::events::{status, PollEvent};
use crate::protocol::command::Command;
use crate::protocol::frame::{decode_frame, ChecksumMode, FrameError, MIN_USABLE_LEN};

/// Something the driver must do on the machine's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Send `command` with an empty data section.
    Send(Command),
    /// Wait the inter-step delay.
    Delay,
    /// Read one reply and pass it to [`PollMachine::on_reply`].
    Read,
    /// Apply the event to the session and notify the consumer.
    Notify(PollEvent),
}

/// How a poll reply was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReply {
    /// Short reply or the idling code; nothing is acknowledged.
    Idle,
    Event(PollEvent),
    /// A code with no event attached; it is still acknowledged.
    Unrecognized(u8),
    /// Strict mode only: the reply failed frame validation.
    Corrupted(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SendPoll,
    DelayAfterPoll,
    Read,
    AwaitingReply,
    DelayAfterReply(PollReply),
    Notify(PollEvent),
    SendAck,
    SendNak,
    DelayAfterAck,
}

/// The polling loop as an explicit state machine.
#[derive(Debug, Clone)]
pub struct PollMachine {
    phase: Phase,
    mode: ChecksumMode,
}

impl PollMachine {
    pub fn new(mode: ChecksumMode) -> Self {
        Self {
            phase: Phase::SendPoll,
            mode,
        }
    }

    /// Returns the next action, or `None` once the loop has ended.
    ///
    /// `enabled` is the session's bill-enabled flag; it is read only at the
    /// iteration boundary.
    pub fn next_action(&mut self, enabled: bool) -> Option<PollAction> {
        let (action, next) = match self.phase {
            Phase::SendPoll if !enabled => return None,
            Phase::SendPoll => (PollAction::Send(Command::Poll), Phase::DelayAfterPoll),
            Phase::DelayAfterPoll => (PollAction::Delay, Phase::Read),
            Phase::Read | Phase::AwaitingReply => (PollAction::Read, Phase::AwaitingReply),
            Phase::DelayAfterReply(reply) => (PollAction::Delay, Self::after_reply(reply)),
            Phase::Notify(event) => (PollAction::Notify(event), Phase::SendAck),
            Phase::SendAck => (PollAction::Send(Command::Ack), Phase::DelayAfterAck),
            Phase::SendNak => (PollAction::Send(Command::Nak), Phase::DelayAfterAck),
            Phase::DelayAfterAck => (PollAction::Delay, Phase::SendPoll),
        };
        self.phase = next;
        Some(action)
    }

    /// Feeds the reply read in response to [`PollAction::Read`].
    pub fn on_reply(&mut self, raw: &[u8]) -> PollReply {
        let reply = classify_reply(raw, self.mode);
        trace!("poll reply {raw:02X?} classified as {reply:?}");
        self.phase = Phase::DelayAfterReply(reply);
        reply
    }

    /// Whether the machine sits at an iteration boundary.
    pub fn at_boundary(&self) -> bool {
        self.phase == Phase::SendPoll
    }

    fn after_reply(reply: PollReply) -> Phase {
        match reply {
            PollReply::Idle => Phase::SendPoll,
            PollReply::Event(event) => Phase::Notify(event),
            PollReply::Unrecognized(_) => Phase::SendAck,
            PollReply::Corrupted(_) => Phase::SendNak,
        }
    }
}

/// Classifies a raw poll reply.
pub fn classify_reply(raw: &[u8], mode: ChecksumMode) -> PollReply {
    if raw.len() < MIN_USABLE_LEN {
        return PollReply::Idle;
    }
    if mode == ChecksumMode::Strict {
        if let Err(e) = decode_frame(raw, mode) {
            return PollReply::Corrupted(e);
        }
    }

    let code = raw[3];
    if code == status::IDLING {
        return PollReply::Idle;
    }
    match PollEvent::classify(code, raw.get(4).copied()) {
        Some(event) => PollReply::Event(event),
        None => PollReply::Unrecognized(code),
    }
}
