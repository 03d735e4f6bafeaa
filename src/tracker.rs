//! Field diffing at the ingestion boundary.
//!
//! The host samples each tracked entity once per tick. An
//! [`EntityTracker`] remembers the last value it saw for every field and
//! turns a snapshot into [`ChangeRecord`]s for the fields that actually
//! changed. Trackers are independent, so each can run on its own thread
//! and feed a shared [`Session`].

use crate::config::{PipelineConfig, ReportConfig};
use crate::error::{Result, TelemetryError};
use crate::fields::FieldKey;
use crate::session::Session;
use crate::types::{Category, ChangeRecord, EntityId, Timestep, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Last observed field values for one entity.
#[derive(Clone, Debug)]
pub struct EntityTracker {
    entity: EntityId,
    category: Category,
    report: ReportConfig,
    state: HashMap<FieldKey, Value>,
}

impl EntityTracker {
    pub fn new(entity: impl Into<EntityId>, report: ReportConfig) -> Self {
        Self {
            entity: entity.into(),
            category: Category::state_update(),
            report,
            state: HashMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = category.into();
        self
    }

    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Record the current value of one field.
    ///
    /// Returns a change record if the value differs from the last one
    /// seen (or the field was never seen). Fields in a group that is
    /// switched off are ignored.
    pub fn observe(
        &mut self,
        timestep: Timestep,
        field: FieldKey,
        value: impl Into<Value>,
    ) -> Option<ChangeRecord> {
        if !self.report.reports(field) {
            return None;
        }

        let value = value.into();
        if self.state.get(&field) == Some(&value) {
            return None;
        }

        let old_value = self.state.insert(field, value.clone());
        Some(ChangeRecord {
            entity: self.entity.clone(),
            timestep,
            category: self.category.clone(),
            field,
            old_value,
            new_value: value,
        })
    }

    /// Observe a whole snapshot, returning the changes in snapshot order.
    pub fn observe_all<I, V>(&mut self, timestep: Timestep, snapshot: I) -> Vec<ChangeRecord>
    where
        I: IntoIterator<Item = (FieldKey, V)>,
        V: Into<Value>,
    {
        snapshot
            .into_iter()
            .filter_map(|(field, value)| self.observe(timestep, field, value))
            .collect()
    }

    pub fn field(&self, field: FieldKey) -> Option<&Value> {
        self.state.get(&field)
    }

    pub fn field_or<'a>(&'a self, field: FieldKey, default: &'a Value) -> &'a Value {
        self.field(field).unwrap_or(default)
    }
}

/// Trackers for every entity currently in the session.
#[derive(Debug, Default)]
pub struct TrackerRegistry {
    report: ReportConfig,
    trackers: HashMap<EntityId, EntityTracker>,
}

impl TrackerRegistry {
    pub fn new(report: ReportConfig) -> Self {
        Self {
            report,
            trackers: HashMap::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.report.clone())
    }

    /// Start tracking an entity, replacing any previous tracker for it.
    pub fn track(&mut self, entity: impl Into<EntityId>) -> &mut EntityTracker {
        let entity = entity.into();
        let tracker = EntityTracker::new(entity.clone(), self.report.clone());
        match self.trackers.entry(entity) {
            Entry::Occupied(mut slot) => {
                slot.insert(tracker);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(tracker),
        }
    }

    pub fn untrack(&mut self, entity: &str) -> Option<EntityTracker> {
        self.trackers.remove(entity)
    }

    pub fn get(&self, entity: &str) -> Option<&EntityTracker> {
        self.trackers.get(entity)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Diff an entity's snapshot and ingest the changes into `session`.
    /// Returns how many changes were ingested.
    pub fn poll<I, V>(
        &mut self,
        entity: &str,
        timestep: Timestep,
        snapshot: I,
        session: &Session,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = (FieldKey, V)>,
        V: Into<Value>,
    {
        let Some(tracker) = self.trackers.get_mut(entity) else {
            tracing::error!(entity, "Failed to poll entity state, entity is not tracked");
            return Err(TelemetryError::EntityNotTracked(EntityId::new(entity)));
        };

        let records = tracker.observe_all(timestep, snapshot);
        Ok(session.ingest_all(records))
    }
}
