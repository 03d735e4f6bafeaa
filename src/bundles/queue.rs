//! Delivery order over stored bundles.

use super::bundle::Bundle;
use crate::types::Timestep;
use std::collections::VecDeque;

/// A bundle taken off the queue for sending.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueEntry {
    pub timestep: Timestep,
    pub bundle: Bundle,
}

/// Timesteps whose bundles are ready to send, head first.
///
/// Holds at most one entry per timestep. Admitting a timestep that is
/// already queued moves it to the tail, so the most recently touched
/// bundle goes out last. Depth stays small while the transport is
/// healthy, so the linear scans are fine.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    entries: VecDeque<Timestep>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `timestep` at the tail, dropping any earlier entry for it.
    pub fn admit(&mut self, timestep: Timestep) {
        self.remove(timestep);
        self.entries.push_back(timestep);
    }

    pub fn take_front(&mut self) -> Option<Timestep> {
        self.entries.pop_front()
    }

    /// Reinsert at the head (failed send).
    pub fn push_front(&mut self, timestep: Timestep) {
        self.remove(timestep);
        self.entries.push_front(timestep);
    }

    /// Drop the entry for `timestep`. Returns whether one existed.
    pub fn remove(&mut self, timestep: Timestep) -> bool {
        let before = self.entries.len();
        self.entries.retain(|t| *t != timestep);
        self.entries.len() != before
    }

    pub fn contains(&self, timestep: Timestep) -> bool {
        self.entries.contains(&timestep)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued timesteps, head first.
    pub fn iter(&self) -> impl Iterator<Item = Timestep> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(queue: &DeliveryQueue) -> Vec<i64> {
        queue.iter().map(|t| t.0).collect()
    }

    #[test]
    fn test_admit_is_fifo() {
        let mut queue = DeliveryQueue::new();
        queue.admit(Timestep(1));
        queue.admit(Timestep(2));
        queue.admit(Timestep(3));

        assert_eq!(order(&queue), vec![1, 2, 3]);
        assert_eq!(queue.take_front(), Some(Timestep(1)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_readmit_moves_to_tail() {
        let mut queue = DeliveryQueue::new();
        queue.admit(Timestep(1));
        queue.admit(Timestep(2));
        queue.admit(Timestep(1));

        assert_eq!(order(&queue), vec![2, 1]);
    }

    #[test]
    fn test_push_front_deduplicates() {
        let mut queue = DeliveryQueue::new();
        queue.admit(Timestep(2));
        queue.admit(Timestep(1));

        queue.push_front(Timestep(1));
        assert_eq!(order(&queue), vec![1, 2]);

        queue.push_front(Timestep(7));
        assert_eq!(order(&queue), vec![7, 1, 2]);
    }

    #[test]
    fn test_take_front_empty() {
        let mut queue = DeliveryQueue::new();
        assert_eq!(queue.take_front(), None);
        assert!(!queue.remove(Timestep(4)));
    }
}
