//! The telemetry session: shared state tying the pipeline together.
//!
//! A [`Session`] owns the bundle store, the delivery queue, the pending
//! counter and the operator notice sink for the lifetime of one
//! connection to the collector. Ingestion callers and the dispatcher
//! share it by reference (typically behind an `Arc`); nothing in the
//! pipeline is global.

use crate::bundles::{Bundle, BundleStore, DeliveryQueue, QueueEntry};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::notices::{Notice, NoticeHandle, NoticeLevel, NoticeSink};
use crate::types::{ChangeRecord, Timestep};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Store and queue, always locked together.
#[derive(Debug, Default)]
struct Outbox {
    store: BundleStore,
    queue: DeliveryQueue,
    /// Set by [`Session::clear`]; nothing enters or leaves afterwards.
    closed: bool,
}

/// Point-in-time counters for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
    /// Entries in the delivery queue.
    pub queued: usize,
    /// Distinct (category, entity) pairs with unsent fields.
    pub pending: u64,
    /// Whether the delivery channel is enabled.
    pub enabled: bool,
}

pub struct Session {
    config: PipelineConfig,

    /// Bundles and their delivery order. One lock, so no observer sees a
    /// half-merged bundle or two queue entries for one timestep.
    outbox: Mutex<Outbox>,

    /// Backlog size for warnings only; the queue is authoritative.
    pending: AtomicU64,

    /// Cleared when a bundle is poisoned, set again by the operator.
    enabled: AtomicBool,

    notices: NoticeSink,
}

impl Session {
    /// Start a session. The returned handle receives operator notices.
    pub fn new(config: PipelineConfig) -> Result<(Self, NoticeHandle)> {
        config.validate()?;
        let (notices, handle) = NoticeSink::channel(config.notice_buffer);

        tracing::info!(
            max_sends_per_tick = config.max_sends_per_tick,
            cooldown_ticks = config.cooldown_ticks,
            "Telemetry session started"
        );

        let session = Self {
            config,
            outbox: Mutex::new(Outbox::default()),
            pending: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
            notices,
        };
        Ok((session, handle))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // --- Ingestion ---

    /// Merge a change into its timestep's bundle and queue that bundle
    /// at the tail.
    ///
    /// Records whose old and new values are equal change nothing and are
    /// skipped; returns false for those and for anything arriving after
    /// the session was cleared.
    pub fn ingest(&self, record: ChangeRecord) -> bool {
        if record.is_noop() {
            tracing::trace!(
                entity = %record.entity,
                field = %record.field,
                tick = record.timestep.0,
                "Skipping unchanged field"
            );
            return false;
        }

        tracing::trace!(
            entity = %record.entity,
            field = %record.field,
            tick = record.timestep.0,
            "Ingesting change"
        );

        let mut outbox = self.outbox.lock();
        if outbox.closed {
            tracing::debug!(
                entity = %record.entity,
                tick = record.timestep.0,
                "Session closed, dropping change"
            );
            return false;
        }
        let outcome = outbox.store.merge(record);
        if outcome.new_pair {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }
        outbox.queue.admit(outcome.timestep);
        true
    }

    /// Ingest records one by one. Returns how many were stored.
    pub fn ingest_all(&self, records: impl IntoIterator<Item = ChangeRecord>) -> usize {
        records
            .into_iter()
            .map(|record| self.ingest(record))
            .filter(|stored| *stored)
            .count()
    }

    // --- Delivery ---

    /// Pop the head of the queue together with its bundle.
    ///
    /// The bundle leaves the store; new changes for the same timestep
    /// start a fresh bundle until this one is sent or pushed back.
    pub fn take_front(&self) -> Option<QueueEntry> {
        let mut outbox = self.outbox.lock();
        if outbox.closed {
            return None;
        }
        while let Some(timestep) = outbox.queue.take_front() {
            if let Some(bundle) = outbox.store.remove(timestep) {
                return Some(QueueEntry { timestep, bundle });
            }
            tracing::warn!(tick = timestep.0, "Queued timestep has no bundle, skipping");
        }
        None
    }

    /// Return an entry to the head of the queue after a failed send.
    ///
    /// If changes for the same timestep arrived while the entry was out,
    /// they are folded into it (newer values win) and the duplicate tail
    /// entry is dropped. Exactly one entry for the timestep remains, at
    /// the head. An entry returned after the session was cleared is dropped.
    pub fn push_front(&self, entry: QueueEntry) {
        let QueueEntry { timestep, mut bundle } = entry;

        let mut outbox = self.outbox.lock();
        if outbox.closed {
            tracing::debug!(
                tick = timestep.0,
                pairs = bundle.pair_count(),
                "Session closed, dropping requeued bundle"
            );
            return;
        }
        if let Some(fresh) = outbox.store.remove(timestep) {
            let overlap = bundle.absorb(fresh);
            self.release_pairs(overlap as u64);
            tracing::debug!(tick = timestep.0, overlap, "Folded newer changes into requeued bundle");
        }
        outbox.store.insert(timestep, bundle);
        outbox.queue.push_front(timestep);
    }

    /// Account for an entry that left the pipeline for good (sent or
    /// discarded).
    pub fn complete(&self, entry: &QueueEntry) {
        self.release_pairs(entry.bundle.pair_count() as u64);
    }

    fn release_pairs(&self, pairs: u64) {
        if pairs == 0 {
            return;
        }
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| Some(p.saturating_sub(pairs)));
    }

    // --- Readouts ---

    /// DeliveryQueue size.
    pub fn queue_len(&self) -> usize {
        self.outbox.lock().queue.len()
    }

    /// PendingCount.
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Queued timesteps, head first.
    pub fn queued_timesteps(&self) -> Vec<Timestep> {
        self.outbox.lock().queue.iter().collect()
    }

    /// Copy of the stored bundle for a timestep.
    pub fn bundle(&self, timestep: Timestep) -> Option<Bundle> {
        self.outbox.lock().store.get(timestep).cloned()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            queued: self.queue_len(),
            pending: self.pending(),
            enabled: self.is_enabled(),
        }
    }

    // --- Channel state ---

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Re-enable delivery after the operator has dealt with a poisoned bundle.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            tracing::info!("Telemetry delivery re-enabled");
        }
    }

    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            tracing::warn!("Telemetry delivery disabled");
        }
    }

    // --- Operator messages ---

    pub fn notify(&self, notice: Notice) -> bool {
        self.notices.send(notice)
    }

    pub fn broadcast(&self, level: NoticeLevel, message: impl Into<String>) -> bool {
        self.notify(Notice::broadcast(level, message))
    }

    /// Whether [`clear`](Self::clear) has ended the session.
    pub fn is_closed(&self) -> bool {
        self.outbox.lock().closed
    }

    /// End of session: drop everything still buffered and stop accepting
    /// changes. Bundles already taken by the dispatcher are dropped when
    /// they come back through [`push_front`](Self::push_front).
    pub fn clear(&self) {
        let mut outbox = self.outbox.lock();
        let dropped = outbox.queue.len();
        outbox.closed = true;
        outbox.store.clear();
        outbox.queue.clear();
        self.pending.store(0, Ordering::SeqCst);
        tracing::info!(dropped, "Telemetry session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKey;
    use crate::types::Value;

    fn session() -> Session {
        Session::new(PipelineConfig::default()).unwrap().0
    }

    #[test]
    fn test_ingest_counts_pairs_once() {
        let session = session();

        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, None, 20));
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Air, None, 300));
        session.ingest(ChangeRecord::new("steve", 1, FieldKey::Health, None, 20));
        session.ingest(ChangeRecord::new("alex", 2, FieldKey::Health, Some(20.into()), 19));

        assert_eq!(session.pending(), 3);
        assert_eq!(session.queue_len(), 2);
    }

    #[test]
    fn test_noop_is_not_stored() {
        let session = session();

        let stored = session.ingest(ChangeRecord::new("alex", 5, FieldKey::Air, Some(300.into()), 300));

        assert!(!stored);
        assert_eq!(session.queue_len(), 0);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_take_front_removes_bundle() {
        let session = session();
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, None, 20));

        let entry = session.take_front().unwrap();
        assert_eq!(entry.timestep, Timestep(1));
        assert!(session.bundle(Timestep(1)).is_none());
        assert!(session.take_front().is_none());

        session.complete(&entry);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_push_front_folds_newer_changes() {
        let session = session();
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, None, 20));
        session.ingest(ChangeRecord::new("alex", 2, FieldKey::Health, Some(20.into()), 19));

        let entry = session.take_front().unwrap();

        // Arrives while timestep 1 is in flight
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, Some(20.into()), 17));
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Air, None, 250));
        assert_eq!(session.queued_timesteps(), vec![Timestep(2), Timestep(1)]);
        assert_eq!(session.pending(), 3);

        session.push_front(entry);

        assert_eq!(session.queued_timesteps(), vec![Timestep(1), Timestep(2)]);
        assert_eq!(session.pending(), 2);

        let bundle = session.bundle(Timestep(1)).unwrap();
        assert_eq!(bundle.get("PlayerStateUpdate", "alex", FieldKey::Health), Some(&Value::from(17)));
        assert_eq!(bundle.get("PlayerStateUpdate", "alex", FieldKey::Air), Some(&Value::from(250)));
    }

    #[test]
    fn test_enable_disable() {
        let session = session();
        assert!(session.is_enabled());
        session.disable();
        assert!(!session.stats().enabled);
        session.enable();
        assert!(session.is_enabled());
    }

    #[test]
    fn test_clear() {
        let session = session();
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, None, 20));
        session.clear();

        assert!(session.is_closed());
        assert_eq!(
            session.stats(),
            SessionStats { queued: 0, pending: 0, enabled: true }
        );
    }

    #[test]
    fn test_clear_stops_ingestion() {
        let session = session();
        session.clear();

        assert!(!session.ingest(ChangeRecord::new("alex", 2, FieldKey::Health, None, 20)));
        assert_eq!(session.queue_len(), 0);
        assert_eq!(session.pending(), 0);
        assert!(session.bundle(Timestep(2)).is_none());
    }

    #[test]
    fn test_clear_while_bundle_in_flight() {
        let session = session();
        session.ingest(ChangeRecord::new("alex", 1, FieldKey::Health, None, 20));

        let entry = session.take_front().unwrap();
        session.clear();
        session.push_front(entry);

        assert!(session.queued_timesteps().is_empty());
        assert!(session.bundle(Timestep(1)).is_none());
        assert_eq!(session.pending(), 0);
        assert!(session.take_front().is_none());
    }
}
