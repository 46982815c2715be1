//! Prefix-typed properties.
//!
//! A property name's prefix fixes its type: `b_` boolean, `n_` decimal,
//! `s_` string. The rule holds for work tags and specification properties
//! alike, so a where-condition can be type-checked from variable names
//! alone.

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::error::{ModelError, ModelResult};

/// Type of a property value or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Number,
    String,
}

impl ValueType {
    /// Type implied by a property name's prefix.
    pub fn of_name(name: &str) -> ModelResult<ValueType> {
        let valid = name.len() > 2
            && name.as_bytes()[1] == b'_'
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid {
            return Err(ModelError::InvalidPropertyName(name.to_string()));
        }
        match name.as_bytes()[0] {
            b'b' => Ok(ValueType::Boolean),
            b'n' => Ok(ValueType::Number),
            b's' => Ok(ValueType::String),
            _ => Err(ModelError::InvalidPropertyName(name.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
        })
    }
}

/// A single property value.
///
/// Numbers are normalized on construction (trailing fractional zeros
/// stripped) so `5.0` and `5` compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(BigDecimal),
    String(String),
}

impl PropertyValue {
    pub fn number(value: BigDecimal) -> Self {
        PropertyValue::Number(value.normalized())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Boolean(_) => ValueType::Boolean,
            PropertyValue::Number(_) => ValueType::Number,
            PropertyValue::String(_) => ValueType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            PropertyValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<BigDecimal> for PropertyValue {
    fn from(value: BigDecimal) -> Self {
        PropertyValue::number(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::number(BigDecimal::from(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::number(BigDecimal::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::number(BigDecimal::from(value))
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::number(BigDecimal::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// Name → value map where every entry has passed the prefix check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, rejecting names whose prefix disagrees with the value.
    pub fn insert(&mut self, name: &str, value: impl Into<PropertyValue>) -> ModelResult<()> {
        let value = match value.into() {
            PropertyValue::Number(n) => PropertyValue::number(n),
            other => other,
        };
        let expected = ValueType::of_name(name)?;
        if expected != value.value_type() {
            return Err(ModelError::PropertyType {
                name: name.to_string(),
                expected,
                actual: value.value_type(),
            });
        }
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    /// Chaining form of [`insert`](Self::insert).
    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> ModelResult<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the subset named by `names`.
    pub fn select(&self, names: &[&str]) -> Properties {
        let entries = names
            .iter()
            .filter_map(|name| {
                self.entries
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Properties { entries }
    }
}

/// Source of variable values for expression evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<&PropertyValue>;
}

impl Scope for Properties {
    fn lookup(&self, name: &str) -> Option<&PropertyValue> {
        self.get(name)
    }
}
