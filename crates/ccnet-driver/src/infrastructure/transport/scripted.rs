//! In-memory transport for tests and dry runs.
//!
//! Replies are queued ahead of time and handed out one per `read`; once the
//! queue is empty every read returns the fallback reply.  Every written frame
//! is recorded.  Clones share the same script, so a test can keep one handle
//! while the validator owns another.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{PortSettings, Transport, TransportError};

#[derive(Debug, Default)]
struct Script {
    open: bool,
    replies: VecDeque<Vec<u8>>,
    fallback: Vec<u8>,
    written: Vec<Vec<u8>>,
    reads: usize,
    fail_open: bool,
    fail_close: bool,
    fail_writes: bool,
    fail_reads: bool,
}

/// A scripted implementation of [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Creates a closed transport with no replies queued.
    ///
    /// The default fallback reply is empty, which the driver treats as idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that is already open.
    pub fn opened() -> Self {
        let transport = Self::new();
        transport.lock().open = true;
        transport
    }

    /// Queues one reply.
    pub fn push_reply(&self, reply: impl Into<Vec<u8>>) {
        self.lock().replies.push_back(reply.into());
    }

    /// Queues several replies in order.
    pub fn push_replies<I, R>(&self, replies: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<u8>>,
    {
        self.lock()
            .replies
            .extend(replies.into_iter().map(Into::into));
    }

    /// Sets the reply returned once the queue is exhausted.
    pub fn set_fallback_reply(&self, reply: impl Into<Vec<u8>>) {
        self.lock().fallback = reply.into();
    }

    pub fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.lock().fail_close = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Simulates the port going away underneath the driver.
    pub fn force_closed(&self) {
        self.lock().open = false;
    }

    /// Every frame written so far, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// The command byte (byte 3) of every frame written so far.
    pub fn written_commands(&self) -> Vec<u8> {
        self.lock()
            .written
            .iter()
            .filter_map(|frame| frame.get(3).copied())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.lock().written.len()
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Replies still queued.
    pub fn pending_replies(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn injected(what: &str) -> TransportError {
    TransportError::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("scripted {what} failure"),
    ))
}

impl Transport for ScriptedTransport {
    fn open(&mut self, _settings: &PortSettings) -> Result<(), TransportError> {
        let mut script = self.lock();
        if script.fail_open {
            return Err(injected("open"));
        }
        script.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut script = self.lock();
        if script.fail_close {
            return Err(injected("close"));
        }
        script.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut script = self.lock();
        if !script.open {
            return Err(TransportError::NotOpen);
        }
        if script.fail_writes {
            return Err(injected("write"));
        }
        script.written.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut script = self.lock();
        if !script.open {
            return Err(TransportError::NotOpen);
        }
        if script.fail_reads {
            return Err(injected("read"));
        }
        script.reads += 1;
        match script.replies.pop_front() {
            Some(reply) => Ok(reply),
            None => Ok(script.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_are_returned_in_order_then_fallback() {
        // Arrange
        let mut transport = ScriptedTransport::opened();
        transport.push_replies([vec![1], vec![2]]);
        transport.set_fallback_reply(vec![9]);

        // Act
        let replies: Vec<_> = (0..4).map(|_| transport.read().unwrap()).collect();

        // Assert
        assert_eq!(replies, vec![vec![1], vec![2], vec![9], vec![9]]);
        assert_eq!(transport.read_count(), 4);
        assert_eq!(transport.pending_replies(), 0);
    }

    #[test]
    fn test_writes_are_recorded_and_visible_through_clones() {
        // Arrange
        let handle = ScriptedTransport::opened();
        let mut transport = handle.clone();

        // Act
        transport.write(&[0x02, 0x03, 0x06, 0x33, 0xDA, 0x81]).unwrap();

        // Assert
        assert_eq!(handle.write_count(), 1);
        assert_eq!(handle.written_commands(), vec![0x33]);
    }

    #[test]
    fn test_closed_transport_rejects_io() {
        let mut transport = ScriptedTransport::new();
        assert!(matches!(transport.write(&[0]), Err(TransportError::NotOpen)));
        assert!(matches!(transport.read(), Err(TransportError::NotOpen)));
        assert_eq!(transport.read_count(), 0);
    }

    #[test]
    fn test_open_and_close_toggle_state() {
        let mut transport = ScriptedTransport::new();
        transport.open(&PortSettings::default()).unwrap();
        assert!(transport.is_open());
        transport.close().unwrap();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_failure_injection() {
        // Arrange
        let mut transport = ScriptedTransport::opened();
        transport.fail_writes(true);
        transport.fail_reads(true);
        transport.fail_open(true);

        // Act / Assert
        assert!(matches!(transport.write(&[0]), Err(TransportError::Io(_))));
        assert!(matches!(transport.read(), Err(TransportError::Io(_))));
        assert!(transport.open(&PortSettings::default()).is_err());
        assert_eq!(transport.write_count(), 0);
    }
}
