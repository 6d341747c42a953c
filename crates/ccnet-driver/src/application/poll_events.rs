//! The blocking poll loop and its consumer interface.
//!
//! A validator has no way to push events: the host polls it repeatedly and
//! acknowledges every non-idle reply.  [`BillValidator::start_polling`] runs
//! that loop on the calling thread by driving a [`PollMachine`] until
//! [`BillValidator::stop`] clears the enabled flag from another thread.

use ccnet_core::{Command, PollAction, PollEvent, PollMachine, PollReply};
use tracing::{debug, info, warn};

use super::validator::{BillValidator, DriverError};
use crate::infrastructure::transport::Transport;

/// Bitmap disabling every bill type.
const DISABLE_ALL_BILL_TYPES: [u8; 6] = [0x00; 6];
/// Response code the validator uses to acknowledge a command.
const ACK_CODE: u8 = 0x00;

/// Consumer hooks invoked by the poll loop.
///
/// Every hook defaults to doing nothing, so implementors override only the
/// events they care about.  Hooks run on the polling thread, between the
/// read of a reply and its acknowledgement.
#[cfg_attr(test, mockall::automock)]
pub trait ValidatorEvents {
    fn on_cassette_initialize(&mut self) {}
    fn on_accept(&mut self) {}
    fn on_escrow_position(&mut self) {}
    fn on_stack(&mut self) {}
    /// A note was stacked; `note_code` is the raw note-type byte.
    fn on_bill_stack(&mut self, _note_code: u8) {}
    fn on_return(&mut self) {}
    fn on_bill_returned(&mut self) {}
    fn on_reject(&mut self) {}
    fn on_drop_cassette_out_of_position(&mut self) {}
}

/// Routes one event to the matching hook.
pub fn dispatch(events: &mut dyn ValidatorEvents, event: PollEvent) {
    match event {
        PollEvent::CassetteInitialized => events.on_cassette_initialize(),
        PollEvent::Accepted => events.on_accept(),
        PollEvent::EscrowPosition => events.on_escrow_position(),
        PollEvent::Stacked => events.on_stack(),
        PollEvent::BillStacked { note_code } => events.on_bill_stack(note_code),
        PollEvent::Returning => events.on_return(),
        PollEvent::BillReturned => events.on_bill_returned(),
        PollEvent::Rejected => events.on_reject(),
        PollEvent::CassetteRemoved => events.on_drop_cassette_out_of_position(),
    }
}

impl<T: Transport> BillValidator<T> {
    /// Polls the validator until bill acceptance is disabled.
    ///
    /// The inserted-note ledger is cleared first.  The loop blocks the calling
    /// thread; call [`stop`](Self::stop) from another thread to end it.  The
    /// stop takes effect at the next iteration boundary.
    ///
    /// # Errors
    ///
    /// - [`DriverError::InvalidState`] without any I/O unless the validator is
    ///   connected, powered up and has its cassette in place.
    /// - [`DriverError::DeviceCommunication`] when the transport fails; the
    ///   loop ends.
    pub fn start_polling(&self, events: &mut dyn ValidatorEvents) -> Result<(), DriverError> {
        let (ready, lifecycle, cassette_present) = self.update_session(|s| {
            s.accepted_notes.clear();
            (s.can_poll(), s.lifecycle(), s.cassette_present)
        });
        if !ready {
            return Err(DriverError::InvalidState(format!(
                "cannot poll in state {lifecycle:?} (cassette present: {cassette_present})"
            )));
        }

        info!("polling started");
        let mut machine = PollMachine::new(self.checksum_mode());
        loop {
            let enabled = self.is_bill_enabled();
            let Some(action) = machine.next_action(enabled) else {
                break;
            };
            match action {
                PollAction::Send(command) => self.send(command, &[])?,
                PollAction::Delay => self.pause(),
                PollAction::Read => {
                    let raw = self.receive()?;
                    match machine.on_reply(&raw) {
                        PollReply::Unrecognized(code) => {
                            warn!("unrecognised poll reply code 0x{code:02X}; acknowledging")
                        }
                        PollReply::Corrupted(e) => warn!("corrupted poll reply: {e}; sending NAK"),
                        PollReply::Idle | PollReply::Event(_) => {}
                    }
                }
                PollAction::Notify(event) => {
                    debug!("poll event {event:?}");
                    self.update_session(|s| s.apply_event(&event));
                    dispatch(events, event);
                }
            }
        }
        info!(
            "polling stopped; {} note(s) stacked",
            self.inserted_banknotes().len()
        );
        Ok(())
    }

    /// Disables bill acceptance and ends the poll loop.
    ///
    /// # Errors
    ///
    /// - [`DriverError::DeviceCommunication`] when the transport fails.
    /// - [`DriverError::UnexpectedReply`] when the validator does not
    ///   acknowledge the disable command.
    pub fn stop(&self) -> Result<(), DriverError> {
        self.update_session(|s| s.bill_enabled = false);
        debug!("bill_enabled = false");

        self.step(Command::EnableBillTypes, &DISABLE_ALL_BILL_TYPES)?;
        let reply = self.receive()?;
        match reply.get(3).copied() {
            Some(ACK_CODE) => Ok(()),
            actual => Err(DriverError::UnexpectedReply {
                expected: ACK_CODE,
                actual,
            }),
        }
    }
}
