//! Sampled backlog warnings.

use crate::config::PipelineConfig;
use crate::notices::NoticeLevel;
use crate::session::Session;
use crate::types::Timestep;

/// Warns the operator while too many changes are waiting to be sent.
///
/// The check is sampled rather than edge-triggered: it fires on every
/// timestep that is a multiple of the frequency for as long as the
/// backlog stays above the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BacklogMonitor {
    threshold: u64,
    frequency: u64,
}

impl BacklogMonitor {
    pub fn new(threshold: u64, frequency: u64) -> Self {
        Self { threshold, frequency }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.backlog_threshold, config.backlog_warning_frequency)
    }

    pub fn should_warn(&self, pending: u64, now: Timestep) -> bool {
        pending > self.threshold && now.is_multiple_of(self.frequency)
    }

    /// Broadcast a warning if the session's backlog qualifies at `now`.
    /// Returns whether a warning was raised.
    pub fn check_and_warn(&self, session: &Session, now: Timestep) -> bool {
        let pending = session.pending();
        if !self.should_warn(pending, now) {
            return false;
        }

        tracing::warn!(pending, queued = session.queue_len(), tick = now.0, "Telemetry backlog");
        session.broadcast(
            NoticeLevel::Warning,
            format!(
                "There are more than {} transactions waiting to be sent ({} pending).",
                self.threshold, pending
            ),
        );
        true
    }
}
