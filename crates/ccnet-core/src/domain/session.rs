//! Per-connection session state.
//!
//! One `SessionState` exists per open connection.  Only the lifecycle and
//! polling code of the driver mutate it; consumers receive clones.

use serde::{Deserialize, Serialize};

use crate::domain::device_error::ErrorCondition;
use crate::domain::events::PollEvent;

/// Coarse lifecycle position derived from the session flags.
///
/// ```text
/// Disconnected ──► Connected ──► PoweredUp ◄──► Enabled
///      ▲                                          │
///      └──────────────── disconnect ──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Disconnected,
    Connected,
    PoweredUp,
    Enabled,
}

/// Mutable state of one validator connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub connected: bool,
    pub powered_up: bool,
    pub bill_enabled: bool,
    pub cassette_present: bool,
    /// Most recent condition decoded from a status check; sticky.
    pub last_error: ErrorCondition,
    /// Note-type codes stacked during the current polling session, in order.
    pub accepted_notes: Vec<u8>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connected: false,
            powered_up: false,
            bill_enabled: false,
            cassette_present: true,
            last_error: ErrorCondition::NoError,
            accepted_notes: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        match (self.connected, self.powered_up, self.bill_enabled) {
            (false, _, _) => LifecycleState::Disconnected,
            (true, false, _) => LifecycleState::Connected,
            (true, true, false) => LifecycleState::PoweredUp,
            (true, true, true) => LifecycleState::Enabled,
        }
    }

    /// Whether a polling session may start.
    pub fn can_poll(&self) -> bool {
        self.connected && self.powered_up && self.cassette_present
    }

    /// Applies the state effect of a poll event.
    pub fn apply_event(&mut self, event: &PollEvent) {
        match *event {
            PollEvent::CassetteInitialized => self.cassette_present = true,
            PollEvent::CassetteRemoved => self.cassette_present = false,
            PollEvent::BillStacked { note_code } => self.accepted_notes.push(note_code),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_disconnected_with_cassette_present() {
        let session = SessionState::new();

        assert_eq!(session.lifecycle(), LifecycleState::Disconnected);
        assert!(session.cassette_present);
        assert_eq!(session.last_error, ErrorCondition::NoError);
        assert!(session.accepted_notes.is_empty());
    }

    #[test]
    fn test_lifecycle_follows_flags() {
        let mut session = SessionState::new();
        session.connected = true;
        assert_eq!(session.lifecycle(), LifecycleState::Connected);
        session.powered_up = true;
        assert_eq!(session.lifecycle(), LifecycleState::PoweredUp);
        session.bill_enabled = true;
        assert_eq!(session.lifecycle(), LifecycleState::Enabled);
        session.bill_enabled = false;
        assert_eq!(session.lifecycle(), LifecycleState::PoweredUp);
    }

    #[test]
    fn test_can_poll_requires_cassette() {
        let mut session = SessionState {
            connected: true,
            powered_up: true,
            ..SessionState::default()
        };
        assert!(session.can_poll());

        session.cassette_present = false;
        assert!(!session.can_poll());
    }

    #[test]
    fn test_bill_stacked_events_accumulate_in_order() {
        // Arrange
        let mut session = SessionState::new();

        // Act
        for note_code in [5, 7, 5] {
            session.apply_event(&PollEvent::BillStacked { note_code });
        }

        // Assert
        assert_eq!(session.accepted_notes, vec![5, 7, 5]);
    }

    #[test]
    fn test_cassette_events_toggle_presence() {
        let mut session = SessionState::new();

        session.apply_event(&PollEvent::CassetteRemoved);
        assert!(!session.cassette_present);

        session.apply_event(&PollEvent::CassetteInitialized);
        assert!(session.cassette_present);
    }

    #[test]
    fn test_other_events_leave_state_unchanged() {
        let mut session = SessionState::new();
        let before = session.clone();

        for event in [
            PollEvent::Accepted,
            PollEvent::EscrowPosition,
            PollEvent::Stacked,
            PollEvent::Returning,
            PollEvent::BillReturned,
            PollEvent::Rejected,
        ] {
            session.apply_event(&event);
        }

        assert_eq!(session, before);
    }
}
