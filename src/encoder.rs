//! Bundle to wire payload conversion.
//!
//! One payload per bundle, a JSON object keyed by category:
//!
//! ```text
//! {
//!   "<category>": {
//!     "id": "<uuid v4>",
//!     "data": {
//!       "tick": <timestep>,
//!       "<entity>": { "<field>": <primitive>, ... },
//!       ...
//!     }
//!   }
//! }
//! ```
//!
//! Every entity of a category shares the category's `data` object next
//! to `tick`. A category with a single entity produces exactly the
//! single-entity layout older collectors expect.
//!
//! The `id` is fresh per category per call and lets the collector drop
//! duplicates. Apart from ids, output is a pure function of the bundle.

use crate::bundles::Bundle;
use crate::error::EncodeError;
use crate::fields::FieldKey;
use crate::types::{Category, EntityId, Number, Timestep, Value};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// Key holding the timestep inside each category's `data` object.
pub const TICK_KEY: &str = "tick";

/// Encode a bundle with freshly generated transaction ids.
pub fn encode(timestep: Timestep, bundle: &Bundle) -> Result<Vec<u8>, EncodeError> {
    encode_with(timestep, bundle, Uuid::new_v4)
}

/// Encode a bundle, drawing one transaction id per category from `next_id`.
pub fn encode_with<F>(timestep: Timestep, bundle: &Bundle, next_id: F) -> Result<Vec<u8>, EncodeError>
where
    F: FnMut() -> Uuid,
{
    let payload = to_json(timestep, bundle, next_id)?;
    Ok(serde_json::to_vec(&payload)?)
}

/// Build the payload as a JSON value.
pub fn to_json<F>(timestep: Timestep, bundle: &Bundle, mut next_id: F) -> Result<JsonValue, EncodeError>
where
    F: FnMut() -> Uuid,
{
    let mut payload = Map::new();

    for (category, entities) in bundle.categories() {
        let mut data = Map::new();
        data.insert(TICK_KEY.to_string(), JsonValue::from(timestep.0));

        for (entity, fields) in entities {
            if entity.as_str() == TICK_KEY {
                return Err(EncodeError::ReservedEntityId {
                    category: category.clone(),
                    entity: entity.clone(),
                });
            }

            let mut object = Map::new();
            for (field, value) in fields {
                object.insert(
                    field.as_str().to_string(),
                    encode_value(category, entity, *field, value)?,
                );
            }
            data.insert(entity.to_string(), JsonValue::Object(object));
        }

        let mut transaction = Map::new();
        transaction.insert("id".to_string(), JsonValue::String(next_id().to_string()));
        transaction.insert("data".to_string(), JsonValue::Object(data));

        payload.insert(category.to_string(), JsonValue::Object(transaction));
    }

    Ok(JsonValue::Object(payload))
}

/// Map one field value to its wire primitive.
fn encode_value(
    category: &Category,
    entity: &EntityId,
    field: FieldKey,
    value: &Value,
) -> Result<JsonValue, EncodeError> {
    match value {
        Value::Number(Number::Int(n)) => Ok(JsonValue::from(*n)),
        Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| EncodeError::NonFiniteNumber {
                category: category.clone(),
                entity: entity.clone(),
                field,
            }),
        Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
        Value::String(s) | Value::Opaque(s) => Ok(JsonValue::String(s.clone())),
    }
}
