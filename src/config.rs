//! Pipeline configuration.
//!
//! The host's configuration layer owns these values; any subset can be
//! overridden from JSON and the rest keep their defaults.

use crate::error::{Result, TelemetryError};
use crate::fields::{FieldGroup, FieldKey};
use serde::Deserialize;
use std::path::Path;

/// Tunables for batching, delivery and backlog reporting.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bundles sent per scheduler tick at most.
    /// Default: 2
    pub max_sends_per_tick: usize,

    /// Ticks to wait after a transient send failure.
    /// Default: 100
    pub cooldown_ticks: u32,

    /// Pending (category, entity) pairs above which the backlog warning fires.
    /// Default: 1000
    pub backlog_threshold: u64,

    /// The backlog warning is only sampled on ticks that are a multiple of this.
    /// Default: 100
    pub backlog_warning_frequency: u64,

    /// Operator notices buffered before new ones are dropped.
    /// Default: 256
    pub notice_buffer: usize,

    /// Opt-in field groups.
    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_sends_per_tick: 2,
            cooldown_ticks: 100,
            backlog_threshold: 1000,
            backlog_warning_frequency: 100,
            notice_buffer: 256,
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sends_per_tick == 0 {
            return Err(TelemetryError::InvalidConfig(
                "max_sends_per_tick must be at least 1".into(),
            ));
        }
        if self.backlog_warning_frequency == 0 {
            return Err(TelemetryError::InvalidConfig(
                "backlog_warning_frequency must be at least 1".into(),
            ));
        }
        if self.notice_buffer == 0 {
            return Err(TelemetryError::InvalidConfig(
                "notice_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which opt-in field groups are reported. Everything defaults to off.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub position: bool,
    pub motion: bool,
    pub distance_walked: bool,
    pub collision: bool,
    pub chunk_coords: bool,
    pub movement: bool,
    pub flight: bool,
    pub size: bool,
    pub dimension: bool,
    pub water: bool,
}

impl ReportConfig {
    /// Report every group.
    pub fn all() -> Self {
        Self {
            position: true,
            motion: true,
            distance_walked: true,
            collision: true,
            chunk_coords: true,
            movement: true,
            flight: true,
            size: true,
            dimension: true,
            water: true,
        }
    }

    pub fn group_enabled(&self, group: FieldGroup) -> bool {
        match group {
            FieldGroup::Position => self.position,
            FieldGroup::Motion => self.motion,
            FieldGroup::DistanceWalked => self.distance_walked,
            FieldGroup::Collision => self.collision,
            FieldGroup::ChunkCoords => self.chunk_coords,
            FieldGroup::Movement => self.movement,
            FieldGroup::Flight => self.flight,
            FieldGroup::Size => self.size,
            FieldGroup::Dimension => self.dimension,
            FieldGroup::Water => self.water,
        }
    }

    /// Ungrouped fields are always reported.
    pub fn reports(&self, field: FieldKey) -> bool {
        field.group().map_or(true, |g| self.group_enabled(g))
    }
}
