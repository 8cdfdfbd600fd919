//! Dynamic values seen by templates.
//!
//! Host data enters templates as [`Value`]s: scalars, strings, safe-marked
//! strings, ordered sequences and mappings, and host objects implementing
//! [`Object`]. Any `Serialize` type converts through [`Value::from_serialize`].
//!
//! # Attribute access
//!
//! `base.name` resolves in a fixed order:
//!
//! 1. mapping key `name` (for objects: [`Object::get_item`])
//! 2. object field `name` ([`Object::get_field`])
//! 3. object method `name`, then `getName`, `isName`, `hasName`
//!    ([`Object::call_method`])
//!
//! Accessing an attribute of an undefined value is an error. A null base, or
//! a defined base without the attribute, yields [`Value::Undefined`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use gable_escape::{Markup, SafeString};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::ErrorKind;

/// Ordered string-keyed mapping used for template mappings and contexts.
pub type Map = IndexMap<String, Value>;

/// A host object exposed to templates.
///
/// Every method has a default that reports "not supported", so implementors
/// only override what they expose.
pub trait Object: fmt::Debug + Send + Sync {
    /// Mapping-style lookup (`obj[key]`, and the first step of `obj.key`).
    fn get_item(&self, _key: &Value) -> Option<Value> {
        None
    }

    /// Public field lookup.
    fn get_field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Calls a zero-argument method.
    fn call_method(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Items for `for` loops. `None` means the object is not iterable.
    fn iterate(&self) -> Option<Vec<Value>> {
        None
    }

    /// Number of items, if the object has a length.
    fn length(&self) -> Option<usize> {
        self.iterate().map(|items| items.len())
    }

    /// Text used when the object is printed.
    fn render(&self) -> Option<String> {
        None
    }

    fn is_truthy(&self) -> bool {
        true
    }
}

/// A template value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A variable or attribute that does not exist.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    /// Text already escaped for one output format.
    Safe(SafeString),
    Seq(Arc<Vec<Value>>),
    Map(Arc<Map>),
    Object(Arc<dyn Object>),
}

impl Value {
    /// Converts any serializable host value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, ErrorKind> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Wraps a host object.
    pub fn from_object<O: Object + 'static>(object: O) -> Value {
        Value::Object(Arc::new(object))
    }

    /// Text marked safe for `strategy`.
    pub fn safe(strategy: impl Into<String>, text: impl Into<String>) -> Value {
        Value::Safe(SafeString::new(strategy, text))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `true` for both null and undefined.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Truthiness used by `if`, `not`, `and` and `or`.
    ///
    /// Undefined, null, `false`, zero, the empty string and empty
    /// containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Safe(s) => !s.as_str().is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(obj) => obj.is_truthy(),
        }
    }

    /// The `empty` test: undefined, null, `false`, `""` and empty containers.
    /// Zero is not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Undefined | Value::Null | Value::Bool(false) => true,
            Value::String(s) => s.is_empty(),
            Value::Safe(s) => s.as_str().is_empty(),
            Value::Seq(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Object(obj) => obj.length() == Some(0),
            _ => false,
        }
    }

    pub fn is_iterable(&self) -> bool {
        match self {
            Value::Seq(_) | Value::Map(_) => true,
            Value::Object(obj) => obj.iterate().is_some(),
            _ => false,
        }
    }

    /// String content of plain and safe strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Safe(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 => Some(*n as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Object>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Length of strings (in characters), containers and sized objects.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Safe(s) => Some(s.as_str().chars().count()),
            Value::Seq(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            Value::Object(obj) => obj.length(),
            _ => None,
        }
    }

    /// The value as escaper input. Safe strings keep their marker.
    pub fn to_markup(&self) -> Markup {
        match self {
            Value::Safe(safe) => Markup::Safe(safe.clone()),
            other => Markup::Raw(other.to_string()),
        }
    }

    /// `(key, item)` pairs visited by a `for` loop.
    ///
    /// Sequences yield their indices as keys, mappings their keys. Anything
    /// that is not iterable yields nothing.
    pub fn iterate(&self) -> Vec<(Value, Value)> {
        match self {
            Value::Seq(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| (Value::from(index), item.clone()))
                .collect(),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| (Value::from(key.as_str()), item.clone()))
                .collect(),
            Value::Object(obj) => obj
                .iterate()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(index, item)| (Value::from(index), item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Resolves `self.name`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::AttributeError`] if `self` is undefined.
    pub fn get_attr(&self, name: &str) -> Result<Value, ErrorKind> {
        let found = match self {
            Value::Undefined => {
                return Err(ErrorKind::AttributeError {
                    attribute: name.to_string(),
                })
            }
            Value::Map(map) => map.get(name).cloned(),
            Value::Seq(items) => name.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            Value::Object(obj) => object_attr(obj.as_ref(), name),
            _ => None,
        };
        Ok(found.unwrap_or_default())
    }

    /// Resolves `self[key]`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::AttributeError`] if `self` is undefined.
    pub fn get_item(&self, key: &Value) -> Result<Value, ErrorKind> {
        let found = match self {
            Value::Undefined => {
                return Err(ErrorKind::AttributeError {
                    attribute: key.to_string(),
                })
            }
            Value::Map(map) => map.get(key.to_string().as_str()).cloned(),
            Value::Seq(items) => key
                .as_i64()
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i).cloned()),
            Value::Object(obj) => obj.get_item(key),
            _ => None,
        };
        Ok(found.unwrap_or_default())
    }

    /// The `in` operator: substring, sequence membership or mapping key.
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::String(_) | Value::Safe(_) => match (self.as_str(), needle.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                (Some(haystack), None) => haystack.contains(&needle.to_string()),
                _ => false,
            },
            Value::Seq(items) => items.iter().any(|item| item == needle),
            Value::Map(map) => map.contains_key(needle.to_string().as_str()),
            Value::Object(obj) => obj
                .iterate()
                .is_some_and(|items| items.iter().any(|item| item == needle)),
            _ => false,
        }
    }

    /// Ordering for `<`, `<=`, `>` and `>=`. Numbers compare numerically,
    /// strings lexically; anything else is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Some(a.cmp(b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self.as_str(), other.as_str()) {
            (Some(a), Some(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn object_attr(obj: &dyn Object, name: &str) -> Option<Value> {
    obj.get_item(&Value::from(name))
        .or_else(|| obj.get_field(name))
        .or_else(|| obj.call_method(name))
        .or_else(|| {
            let capitalized = capitalize(name);
            ["get", "is", "has"]
                .into_iter()
                .find_map(|prefix| obj.call_method(&format!("{prefix}{capitalized}")))
        })
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (
                Value::Undefined | Value::Null,
                Value::Undefined | Value::Null,
            ) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    return a == b;
                }
                match (self.as_str(), other.as_str()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
    }
}

/// Printed form. Undefined and null print nothing, booleans print
/// `true`/`false`, sequences and mappings print as JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined | Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Safe(s) => f.write_str(s.as_str()),
            Value::Seq(_) | Value::Map(_) => {
                f.write_str(&serde_json::to_string(self).unwrap_or_default())
            }
            Value::Object(obj) => match obj.render() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Safe(s) => serializer.serialize_str(s.as_str()),
            Value::Seq(items) => serialize_items(items, serializer),
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Object(obj) => match obj.iterate() {
                Some(items) => serialize_items(&items, serializer),
                None => match obj.render() {
                    Some(text) => serializer.serialize_str(&text),
                    None => serializer.serialize_unit(),
                },
            },
        }
    }
}

fn serialize_items<S: Serializer>(items: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(items.len()))?;
    for item in items {
        seq.serialize_element(item)?;
    }
    seq.end()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<SafeString> for Value {
    fn from(s: SafeString) -> Self {
        Value::Safe(s)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Seq(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Value::Map(Arc::new(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Seq(Arc::new(iter.into_iter().collect()))
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(Arc::new(iter.into_iter().collect()))
    }
}
