//! The nested category -> entity -> field mapping for one timestep.

use crate::fields::FieldKey;
use crate::types::{Category, EntityId, Value};
use std::collections::BTreeMap;

/// Latest value per field for one entity.
pub type EntityFields = BTreeMap<FieldKey, Value>;

/// All changed fields for one timestep.
///
/// At most one value exists per (category, entity, field); a later write
/// replaces the earlier one. Ordered maps keep iteration, and therefore
/// encoding, deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    categories: BTreeMap<Category, BTreeMap<EntityId, EntityFields>>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a field value, creating intermediate maps as needed.
    ///
    /// Returns true when this is the first field for the (category, entity)
    /// pair in this bundle.
    pub fn set(&mut self, category: Category, entity: EntityId, field: FieldKey, value: Value) -> bool {
        let entities = self.categories.entry(category).or_default();
        let mut new_pair = false;
        let fields = entities.entry(entity).or_insert_with(|| {
            new_pair = true;
            EntityFields::new()
        });
        fields.insert(field, value);
        new_pair
    }

    pub fn get(&self, category: &str, entity: &str, field: FieldKey) -> Option<&Value> {
        self.entity(category, entity)?.get(&field)
    }

    /// Fields recorded for one entity.
    pub fn entity(&self, category: &str, entity: &str) -> Option<&EntityFields> {
        self.categories.get(category)?.get(entity)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&Category, &BTreeMap<EntityId, EntityFields>)> {
        self.categories.iter()
    }

    /// Number of distinct (category, entity) pairs.
    pub fn pair_count(&self) -> usize {
        self.categories.values().map(|entities| entities.len()).sum()
    }

    /// Number of field values across all pairs.
    pub fn field_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(|entities| entities.values())
            .map(|fields| fields.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Fold a newer bundle for the same timestep into this one.
    ///
    /// Values from `newer` win. Returns how many (category, entity) pairs
    /// were already present here, i.e. were counted twice.
    pub fn absorb(&mut self, newer: Bundle) -> usize {
        let mut overlap = 0;
        for (category, entities) in newer.categories {
            let ours = self.categories.entry(category).or_default();
            for (entity, fields) in entities {
                match ours.get_mut(&entity) {
                    Some(existing) => {
                        overlap += 1;
                        existing.extend(fields);
                    }
                    None => {
                        ours.insert(entity, fields);
                    }
                }
            }
        }
        overlap
    }
}
