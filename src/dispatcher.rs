//! Rate-bounded delivery of queued bundles.
//!
//! Once per scheduler tick the [`Dispatcher`] sends at most
//! `max_sends_per_tick` bundles from the head of the session's queue.
//!
//! Failure handling:
//! - transport not writable, or a connection error while writing: the
//!   bundle goes back to the head of the queue and nothing is sent for
//!   `cooldown_ticks` ticks. Retried forever; never dropped.
//! - anything else (unencodable bundle, unclassified transport failure):
//!   the bundle is discarded as poisoned, the delivery channel is
//!   disabled and the operator is told how to turn it back on.

use crate::backlog::BacklogMonitor;
use crate::bundles::QueueEntry;
use crate::config::PipelineConfig;
use crate::encoder;
use crate::error::{TelemetryError, TransportError};
use crate::notices::NoticeLevel;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::Timestep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    /// Queue was empty after the last drain.
    Idle,
    /// Waiting after a transient failure.
    Cooling { ticks_remaining: u32 },
    /// Hit the per-tick limit with entries left.
    Draining,
}

/// What one tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Delivery channel is disabled; nothing attempted.
    Disabled,
    /// Still cooling down; nothing attempted.
    Cooling { ticks_remaining: u32 },
    /// Sent up to the limit or until the queue ran dry.
    Drained { sent: usize },
    /// The transport was unavailable. The head bundle was requeued and a
    /// cooldown started.
    Deferred { sent: usize, reason: TransportError },
    /// A bundle could not be sent for a non-transient reason. It was
    /// discarded and the channel disabled.
    Poisoned {
        sent: usize,
        timestep: Timestep,
        error: TelemetryError,
    },
}

impl TickOutcome {
    /// Bundles delivered during the tick.
    pub fn sent(&self) -> usize {
        match self {
            TickOutcome::Drained { sent }
            | TickOutcome::Deferred { sent, .. }
            | TickOutcome::Poisoned { sent, .. } => *sent,
            TickOutcome::Disabled | TickOutcome::Cooling { .. } => 0,
        }
    }
}

pub struct Dispatcher {
    max_sends_per_tick: usize,
    cooldown_ticks: u32,
    state: DispatchState,
    monitor: BacklogMonitor,
}

impl Dispatcher {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_sends_per_tick: config.max_sends_per_tick,
            cooldown_ticks: config.cooldown_ticks,
            state: DispatchState::Idle,
            monitor: BacklogMonitor::from_config(config),
        }
    }

    /// A dispatcher using the same limits and backlog settings as `session`.
    pub fn for_session(session: &Session) -> Self {
        Self::new(session.config())
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Run one scheduler tick: drain (or wait out the cooldown), then
    /// sample the backlog warning for `now`.
    pub fn tick<T>(&mut self, session: &Session, transport: &mut T, now: Timestep) -> TickOutcome
    where
        T: Transport + ?Sized,
    {
        let outcome = self.step(session, transport);
        self.monitor.check_and_warn(session, now);
        outcome
    }

    fn step<T>(&mut self, session: &Session, transport: &mut T) -> TickOutcome
    where
        T: Transport + ?Sized,
    {
        if let DispatchState::Cooling { ticks_remaining } = self.state {
            if ticks_remaining > 0 {
                let ticks_remaining = ticks_remaining - 1;
                self.state = DispatchState::Cooling { ticks_remaining };
                return TickOutcome::Cooling { ticks_remaining };
            }
            self.state = DispatchState::Idle;
        }

        if !session.is_enabled() {
            return TickOutcome::Disabled;
        }

        self.drain(session, transport)
    }

    fn drain<T>(&mut self, session: &Session, transport: &mut T) -> TickOutcome
    where
        T: Transport + ?Sized,
    {
        let mut sent = 0;

        while sent < self.max_sends_per_tick {
            let Some(entry) = session.take_front() else {
                break;
            };
            self.state = DispatchState::Draining;

            if !transport.is_writable() {
                let reason = TransportError::Connection("transport is not writable".into());
                return self.defer(session, entry, sent, reason);
            }

            let payload = match encoder::encode(entry.timestep, &entry.bundle) {
                Ok(payload) => payload,
                Err(e) => return self.poison(session, entry, sent, e.into()),
            };

            match transport.send(&payload) {
                Ok(()) => {
                    tracing::debug!(
                        tick = entry.timestep.0,
                        bytes = payload.len(),
                        pairs = entry.bundle.pair_count(),
                        "Sent transaction bundle"
                    );
                    session.complete(&entry);
                    sent += 1;
                }
                Err(e) if e.is_transient() => return self.defer(session, entry, sent, e),
                Err(e) => return self.poison(session, entry, sent, e.into()),
            }
        }

        self.state = if session.queue_len() == 0 {
            DispatchState::Idle
        } else {
            DispatchState::Draining
        };
        TickOutcome::Drained { sent }
    }

    fn defer(
        &mut self,
        session: &Session,
        entry: QueueEntry,
        sent: usize,
        reason: TransportError,
    ) -> TickOutcome {
        tracing::error!(
            tick = entry.timestep.0,
            error = %reason,
            cooldown_ticks = self.cooldown_ticks,
            "Failed to send transaction bundle"
        );
        session.push_front(entry);
        self.state = DispatchState::Cooling {
            ticks_remaining: self.cooldown_ticks,
        };
        TickOutcome::Deferred { sent, reason }
    }

    fn poison(
        &mut self,
        session: &Session,
        entry: QueueEntry,
        sent: usize,
        error: TelemetryError,
    ) -> TickOutcome {
        tracing::error!(
            tick = entry.timestep.0,
            error = %error,
            "Unexpected error while sending transaction bundle, discarding it"
        );

        session.complete(&entry);
        session.disable();

        session.broadcast(NoticeLevel::Error, format!("Unexpected error occurred: {}", error));
        session.broadcast(NoticeLevel::Error, "Please report the above error to the developer!");
        session.broadcast(NoticeLevel::Warning, "Disabling telemetry delivery.");
        session.broadcast(
            NoticeLevel::Info,
            "Once the cause is fixed, re-enable delivery with Session::enable().",
        );

        self.state = DispatchState::Idle;
        TickOutcome::Poisoned {
            sent,
            timestep: entry.timestep,
            error,
        }
    }
}
