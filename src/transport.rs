//! The boundary to the streaming connection.
//!
//! The connection itself (handshake, framing, reconnects) belongs to the
//! host. The dispatcher only asks whether it can write right now and
//! whether a write went through.

use crate::error::TransportError;
use std::collections::VecDeque;

/// A writable channel to the remote collector.
pub trait Transport {
    /// Whether the connection is open for writing at this moment.
    fn is_writable(&self) -> bool;

    /// Write one payload. Outcome is known when this returns.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// In-memory transport that records payloads.
///
/// Writability can be toggled and failures scripted, which makes it
/// useful for tests and for hosts that replay telemetry locally.
#[derive(Debug)]
pub struct MemoryTransport {
    writable: bool,
    sent: Vec<Vec<u8>>,
    /// Failures returned by the next sends, in order.
    scripted: VecDeque<TransportError>,
    attempts: usize,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// A connected transport.
    pub fn new() -> Self {
        Self {
            writable: true,
            sent: Vec::new(),
            scripted: VecDeque::new(),
            attempts: 0,
        }
    }

    /// A transport that starts disconnected.
    pub fn offline() -> Self {
        Self {
            writable: false,
            ..Self::new()
        }
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// Make the next send fail with `error`.
    pub fn fail_next(&mut self, error: TransportError) {
        self.scripted.push_back(error);
    }

    /// Successfully written payloads, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Successfully written payloads parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|bytes| serde_json::from_slice(bytes).ok())
            .collect()
    }

    /// Number of `send` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MemoryTransport {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.attempts += 1;
        if let Some(error) = self.scripted.pop_front() {
            return Err(error);
        }
        if !self.writable {
            return Err(TransportError::Connection("not connected".into()));
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }
}
