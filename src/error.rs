//! Error types for the telemetry pipeline.

use crate::fields::FieldKey;
use crate::types::{Category, EntityId};
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Entity is not tracked: {0}")]
    EntityNotTracked(EntityId),
}

impl From<serde_json::Error> for TelemetryError {
    fn from(e: serde_json::Error) -> Self {
        TelemetryError::Deserialization(e.to_string())
    }
}

/// A bundle that cannot be turned into a wire payload.
///
/// These are programmer errors upstream of the encoder: a field type
/// contract was violated. They are never retried.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{category}/{entity} {field}: non-finite number cannot be converted to JSON")]
    NonFiniteNumber {
        category: Category,
        entity: EntityId,
        field: FieldKey,
    },

    #[error("{category}/{entity}: entity id collides with the reserved tick key")]
    ReservedEntityId { category: Category, entity: EntityId },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EncodeError {
    fn from(e: serde_json::Error) -> Self {
        EncodeError::Serialization(e.to_string())
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport) write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is not open or dropped mid-write. Retried after a cooldown.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other write failure. Fatal to the delivery channel.
    #[error("Transport failure: {0}")]
    Failed(String),
}

impl TransportError {
    /// Whether the dispatcher should requeue and retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connection(_))
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;
