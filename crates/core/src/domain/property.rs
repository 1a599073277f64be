// Property Tree - typed view over decoded property-list documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{DecodeError, Result};

/// One node of a decoded property list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    /// ISO-8601 rendering of a plist `<date>`
    Date(String),
    Data(Vec<u8>),
    Array(Vec<PropertyValue>),
    Dictionary(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Short name of the variant, used in shape errors
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Real(_) => "real",
            PropertyValue::String(_) => "string",
            PropertyValue::Date(_) => "date",
            PropertyValue::Data(_) => "data",
            PropertyValue::Array(_) => "array",
            PropertyValue::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    /// Integer reading with base-10 `parseInt` semantics:
    /// integers as-is, reals truncated, strings by their leading digit run.
    pub fn to_base10_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            PropertyValue::Real(r) if r.is_finite() => Some(r.trunc() as i64),
            PropertyValue::String(s) => parse_int_prefix(s),
            _ => None,
        }
    }
}

/// Leading optional sign plus digit run, after leading whitespace
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Decoded dictionary document (`ideviceinfo -x` output and friends).
///
/// Accessors distinguish "absent" (`Ok(None)`) from "present with the wrong
/// shape" (`Err(DecodeError::WrongType)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceProperties(BTreeMap<String, PropertyValue>);

impl DeviceProperties {
    pub fn new(entries: BTreeMap<String, PropertyValue>) -> Self {
        Self(entries)
    }

    /// Wrap a decoded document, which must be a dictionary
    pub fn from_value(value: PropertyValue) -> Result<Self> {
        match value {
            PropertyValue::Dictionary(map) => Ok(Self(map)),
            other => Err(DecodeError::UnexpectedShape {
                expected: "dictionary",
                found: other.kind(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(key.into(), value)
    }

    pub fn into_inner(self) -> BTreeMap<String, PropertyValue> {
        self.0
    }

    pub fn string(&self, key: &str) -> Result<Option<&str>> {
        self.typed(key, "string", PropertyValue::as_str)
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        self.typed(key, "integer", PropertyValue::as_i64)
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>> {
        self.typed(key, "boolean", PropertyValue::as_bool)
    }

    pub fn dictionary(&self, key: &str) -> Result<Option<&BTreeMap<String, PropertyValue>>> {
        self.typed(key, "dictionary", PropertyValue::as_dictionary)
    }

    /// Base-10 integer from an integer, real or numeric string field
    pub fn base10_integer(&self, key: &str) -> Result<Option<i64>> {
        self.typed(key, "base-10 integer", PropertyValue::to_base10_integer)
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &'static str,
        read: impl FnOnce(&'a PropertyValue) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => read(value).map(Some).ok_or_else(|| DecodeError::WrongType {
                key: key.to_string(),
                expected,
            }),
        }
    }
}

impl From<BTreeMap<String, PropertyValue>> for DeviceProperties {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        Self(map)
    }
}

impl From<DeviceProperties> for PropertyValue {
    fn from(props: DeviceProperties) -> Self {
        PropertyValue::Dictionary(props.0)
    }
}
