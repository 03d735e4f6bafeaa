//! Timestep-keyed bundle storage.

use super::bundle::Bundle;
use crate::types::{ChangeRecord, Timestep};
use std::collections::BTreeMap;

/// What a merge changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    pub timestep: Timestep,
    /// The record opened a new (category, entity) pair in its bundle.
    pub new_pair: bool,
}

/// Bundles waiting to be sent, keyed by timestep.
#[derive(Debug, Default)]
pub struct BundleStore {
    bundles: BTreeMap<Timestep, Bundle>,
}

impl BundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record's (category, entity, field) slot in
    /// the bundle for its timestep, creating the bundle on first use.
    pub fn merge(&mut self, record: ChangeRecord) -> MergeOutcome {
        let timestep = record.timestep;
        let new_pair = self.bundles.entry(timestep).or_default().set(
            record.category,
            record.entity,
            record.field,
            record.new_value,
        );
        MergeOutcome { timestep, new_pair }
    }

    pub fn get(&self, timestep: Timestep) -> Option<&Bundle> {
        self.bundles.get(&timestep)
    }

    /// Take a bundle out of the store (it is being sent).
    pub fn remove(&mut self, timestep: Timestep) -> Option<Bundle> {
        self.bundles.remove(&timestep)
    }

    /// Put a bundle back, replacing whatever is stored for the timestep.
    pub fn insert(&mut self, timestep: Timestep, bundle: Bundle) {
        self.bundles.insert(timestep, bundle);
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Stored timesteps in ascending order.
    pub fn timesteps(&self) -> impl Iterator<Item = Timestep> + '_ {
        self.bundles.keys().copied()
    }

    pub fn clear(&mut self) {
        self.bundles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKey;
    use crate::types::Value;

    #[test]
    fn test_merge_creates_and_extends_bundles() {
        let mut store = BundleStore::new();

        let first = store.merge(ChangeRecord::new("alex", 5, FieldKey::Health, Some(20.into()), 18));
        let second = store.merge(ChangeRecord::new("alex", 5, FieldKey::Health, Some(18.into()), 15));
        let other = store.merge(ChangeRecord::new("alex", 6, FieldKey::Air, None, 300));

        assert!(first.new_pair);
        assert!(!second.new_pair);
        assert!(other.new_pair);
        assert_eq!(store.len(), 2);

        let bundle = store.get(Timestep(5)).unwrap();
        assert_eq!(bundle.get("PlayerStateUpdate", "alex", FieldKey::Health), Some(&Value::from(15)));
        assert_eq!(store.timesteps().collect::<Vec<_>>(), vec![Timestep(5), Timestep(6)]);
    }

    #[test]
    fn test_categories_are_separate_pairs() {
        let mut store = BundleStore::new();

        store.merge(ChangeRecord::new("alex", 1, FieldKey::Score, None, 1));
        let outcome = store
            .merge(ChangeRecord::new("alex", 1, FieldKey::Score, None, 1).with_category("Leaderboard"));

        assert!(outcome.new_pair);
        assert_eq!(store.get(Timestep(1)).unwrap().pair_count(), 2);
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut store = BundleStore::new();
        store.merge(ChangeRecord::new("alex", 3, FieldKey::Health, None, 20));

        let bundle = store.remove(Timestep(3)).unwrap();
        assert!(store.is_empty());

        store.insert(Timestep(3), bundle.clone());
        assert_eq!(store.get(Timestep(3)), Some(&bundle));
    }
}
