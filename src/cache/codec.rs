//! Codec Module
//!
//! Converts values to and from the text held by the store. Scalars travel as
//! their plain textual form, everything else as JSON. Date/time values use
//! chrono's RFC 3339 serde encoding, never epoch numbers.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::CodecError;

// == Shape ==
/// Primitive kinds that decode from plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
}

/// Describes how a cached payload must be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Scalar(ScalarKind),
    ListOf(Box<Shape>),
    MapOf(ScalarKind, Box<Shape>),
    /// Structured record, identified by its type name
    Record(&'static str),
}

impl Shape {
    /// Returns a compact human-readable form, used in log lines.
    pub fn describe(&self) -> String {
        match self {
            Shape::Scalar(kind) => format!("{:?}", kind).to_lowercase(),
            Shape::ListOf(inner) => format!("list<{}>", inner.describe()),
            Shape::MapOf(key, value) => {
                format!("map<{}, {}>", format!("{:?}", key).to_lowercase(), value.describe())
            }
            Shape::Record(name) => name.rsplit("::").next().unwrap_or(name).to_string(),
        }
    }
}

// == Cacheable ==
/// A type that can be stored by the cache engine.
///
/// Record types need only an empty impl; the default shape names the type.
/// Unknown fields in cached payloads are ignored unless the type opts into
/// `#[serde(deny_unknown_fields)]`.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn shape() -> Shape {
        Shape::Record(std::any::type_name::<Self>())
    }
}

/// Scalar types allowed as map keys.
pub trait MapKey: Cacheable {
    const KIND: ScalarKind;
}

macro_rules! scalar_cacheable {
    ($kind:expr => $($ty:ty),+) => {
        $(
            impl Cacheable for $ty {
                fn shape() -> Shape {
                    Shape::Scalar($kind)
                }
            }
        )+
    };
}

scalar_cacheable!(ScalarKind::Text => String, DateTime<Utc>, NaiveDateTime, NaiveDate);
scalar_cacheable!(ScalarKind::Integer => i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
scalar_cacheable!(ScalarKind::Float => f32, f64);
scalar_cacheable!(ScalarKind::Boolean => bool);

macro_rules! map_key {
    ($kind:expr => $($ty:ty),+) => {
        $(
            impl MapKey for $ty {
                const KIND: ScalarKind = $kind;
            }
        )+
    };
}

map_key!(ScalarKind::Text => String);
map_key!(ScalarKind::Integer => i32, i64, u32, u64);

impl<T: Cacheable> Cacheable for Vec<T> {
    fn shape() -> Shape {
        Shape::ListOf(Box::new(T::shape()))
    }
}

impl<K, V> Cacheable for HashMap<K, V>
where
    K: MapKey + Eq + Hash,
    V: Cacheable,
{
    fn shape() -> Shape {
        Shape::MapOf(K::KIND, Box::new(V::shape()))
    }
}

impl<K, V> Cacheable for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Cacheable,
{
    fn shape() -> Shape {
        Shape::MapOf(K::KIND, Box::new(V::shape()))
    }
}

impl Cacheable for Value {}

// == Encode ==
/// Serializes a value into the text written to the store.
///
/// # Returns
/// Plain text for `Text` scalars, JSON for everything else.
pub fn encode<T: Cacheable>(value: &T) -> Result<String, CodecError> {
    let encode_err = |e: serde_json::Error| CodecError::Encode {
        message: e.to_string(),
    };

    match T::shape() {
        // Strings are stored without JSON quoting
        Shape::Scalar(ScalarKind::Text) => match serde_json::to_value(value).map_err(encode_err)? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        },
        // Numbers and booleans print identically as JSON and as plain text
        _ => serde_json::to_string(value).map_err(encode_err),
    }
}

// == Decode ==
/// Decodes stored text according to `T`'s shape.
///
/// Scalar shapes parse their plain textual form; list, map and record shapes
/// go through a typed JSON parse so nested elements keep their field types.
pub fn decode<T: Cacheable>(raw: &str) -> Result<T, CodecError> {
    let shape = T::shape();
    let decode_err = |message: String| CodecError::Decode {
        shape: shape.describe(),
        message,
    };

    let value = match &shape {
        Shape::Scalar(ScalarKind::Text) => Value::String(raw.to_owned()),
        Shape::Scalar(ScalarKind::Integer) => {
            let text = raw.trim();
            match text.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => text
                    .parse::<u64>()
                    .map(Value::from)
                    .map_err(|e| decode_err(e.to_string()))?,
            }
        }
        Shape::Scalar(ScalarKind::Float) => {
            let n = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| decode_err(e.to_string()))?;
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| decode_err(format!("non-finite float {}", n)))?
        }
        Shape::Scalar(ScalarKind::Boolean) => raw
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| decode_err(e.to_string()))?,
        Shape::ListOf(_) | Shape::MapOf(..) | Shape::Record(_) => {
            return serde_json::from_str(raw).map_err(|e| decode_err(e.to_string()));
        }
    };

    serde_json::from_value(value).map_err(|e| decode_err(e.to_string()))
}
