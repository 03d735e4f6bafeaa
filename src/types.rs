//! Core types for the telemetry pipeline.

use crate::fields::FieldKey;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Discrete unit of simulation time; the batching granularity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestep(pub i64);

impl Timestep {
    /// True when this timestep falls on a multiple of `period`.
    ///
    /// A zero period never matches.
    pub fn is_multiple_of(self, period: u64) -> bool {
        if period == 0 {
            return false;
        }
        (self.0 as i128).rem_euclid(period as i128) == 0
    }
}

impl fmt::Debug for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestep {
    fn from(tick: i64) -> Self {
        Timestep(tick)
    }
}

/// Kind of change a record belongs to; the top-level key of a wire payload.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category(String);

/// Identity of a tracked entity (e.g. a player name).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(Category);
string_newtype!(EntityId);

impl Category {
    /// Category used for per-entity field updates.
    pub fn state_update() -> Self {
        Category::new("PlayerStateUpdate")
    }
}

/// Numeric field value.
///
/// Floats compare by bit pattern, so `NaN == NaN` and `0.0 != -0.0`.
/// Integers never equal floats.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Number {}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

/// A tracked field's value.
///
/// `Opaque` carries the canonical string form of anything that is not a
/// number, boolean or string (identifiers, collections, domain objects).
/// It is stringified once, when the value is observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Number(Number),
    Boolean(bool),
    String(String),
    Opaque(String),
}

impl Value {
    /// Wrap any displayable value in its canonical string form.
    pub fn opaque(value: impl fmt::Display) -> Self {
        Value::Opaque(value.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(Number::Int(n)) => Some(*n as f64),
            Value::Number(Number::Float(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Text of a `String` or `Opaque` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Opaque(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) | Value::Opaque(s) => f.write_str(s),
        }
    }
}

macro_rules! int_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::Int(n as i64))
                }
            }
        )*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(Number::Float(n as f64))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// One observed field mutation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub entity: EntityId,
    pub timestep: Timestep,
    pub category: Category,
    pub field: FieldKey,
    /// Value before the change (`None` on first observation).
    pub old_value: Option<Value>,
    pub new_value: Value,
}

impl ChangeRecord {
    /// Create a field update in the default state-update category.
    pub fn new(
        entity: impl Into<EntityId>,
        timestep: i64,
        field: FieldKey,
        old_value: Option<Value>,
        new_value: impl Into<Value>,
    ) -> Self {
        Self {
            entity: entity.into(),
            timestep: Timestep(timestep),
            category: Category::state_update(),
            field,
            old_value,
            new_value: new_value.into(),
        }
    }

    /// Override the category.
    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = category.into();
        self
    }

    /// True when the record does not actually change anything.
    pub fn is_noop(&self) -> bool {
        self.old_value.as_ref() == Some(&self.new_value)
    }
}
