//! Operator-visible messages.
//!
//! Warnings and errors meant for a human (backlog growing, channel
//! disabled) go through a bounded channel to whatever collaborator shows
//! them. Sending never blocks: when the buffer is full the notice is
//! dropped and logged instead.

use crate::types::EntityId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One message for the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Recipient; `None` broadcasts to everyone.
    pub target: Option<EntityId>,
}

impl Notice {
    pub fn broadcast(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            target: None,
        }
    }

    pub fn to(target: impl Into<EntityId>, level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            target: Some(target.into()),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }
}

/// Sending half, held by the session.
#[derive(Clone, Debug)]
pub struct NoticeSink {
    sender: Sender<Notice>,
}

impl NoticeSink {
    /// Create a sink and its receiving handle.
    pub fn channel(capacity: usize) -> (NoticeSink, NoticeHandle) {
        let (sender, receiver) = bounded(capacity);
        (NoticeSink { sender }, NoticeHandle { receiver })
    }

    /// Deliver a notice. Returns false if it was dropped.
    pub fn send(&self, notice: Notice) -> bool {
        match self.sender.try_send(notice) {
            Ok(()) => true,
            Err(TrySendError::Full(notice)) => {
                tracing::warn!(notice = %notice.message, "Notice buffer full, dropping notice");
                false
            }
            Err(TrySendError::Disconnected(notice)) => {
                tracing::debug!(notice = %notice.message, "No notice receiver, dropping notice");
                false
            }
        }
    }
}

/// Receiving half, handed to the host's messaging collaborator.
pub struct NoticeHandle {
    receiver: Receiver<Notice>,
}

impl NoticeHandle {
    /// Receive the next notice (blocking).
    pub fn recv(&self) -> Result<Notice, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notice (non-blocking).
    pub fn try_recv(&self) -> Result<Notice, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Notice, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered.
    pub fn drain(&self) -> Vec<Notice> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_and_targeted() {
        let (sink, handle) = NoticeSink::channel(4);

        sink.send(Notice::broadcast(NoticeLevel::Warning, "backlog"));
        sink.send(Notice::to("alex", NoticeLevel::Info, "hello"));

        let notices = handle.drain();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].is_broadcast());
        assert_eq!(notices[1].target, Some(EntityId::new("alex")));
    }

    #[test]
    fn test_full_buffer_drops() {
        let (sink, handle) = NoticeSink::channel(1);

        assert!(sink.send(Notice::broadcast(NoticeLevel::Info, "first")));
        assert!(!sink.send(Notice::broadcast(NoticeLevel::Info, "second")));

        assert_eq!(handle.try_recv().unwrap().message, "first");
        assert!(handle.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_receiver() {
        let (sink, handle) = NoticeSink::channel(1);
        drop(handle);
        assert!(!sink.send(Notice::broadcast(NoticeLevel::Error, "nobody listening")));
    }
}
