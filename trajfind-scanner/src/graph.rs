//! Reflective access to host object graphs.
//!
//! The scanner never assumes a concrete container type. Anything that can
//! enumerate its own keys, look a key up, and report an identity for
//! object-like nodes can be scanned through [`HostNode`].

use crate::error::{Result, ScanError};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Minimal read-only view of a node in a host graph.
///
/// Arrays are treated as objects keyed by their decimal indices.
pub trait HostNode: Clone {
    /// Identity of an object-like node, stable for the node's lifetime.
    /// Leaves have no identity.
    fn identity(&self) -> Option<usize>;

    /// True for non-null objects and arrays.
    fn is_object(&self) -> bool;

    /// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy,
    /// every object is truthy.
    fn is_truthy(&self) -> bool;

    /// String content of a text leaf.
    fn as_str(&self) -> Option<&str>;

    /// Own keys in host enumeration order. Empty for leaves.
    fn keys(&self) -> Result<Vec<String>>;

    /// Property lookup. `Ok(None)` when the key is absent or the node is a leaf.
    fn get(&self, key: &str) -> Result<Option<Self>>;
}

impl<'a> HostNode for &'a Value {
    fn identity(&self) -> Option<usize> {
        match *self {
            Value::Object(_) | Value::Array(_) => Some(*self as *const Value as usize),
            _ => None,
        }
    }

    fn is_object(&self) -> bool {
        matches!(*self, Value::Object(_) | Value::Array(_))
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(match *self {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        })
    }

    fn get(&self, key: &str) -> Result<Option<Self>> {
        Ok(match *self {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// A value in a shared, mutable host graph.
///
/// Objects are reference counted and interior mutable, so the same object may
/// be reachable from several parents, including itself. Cloning a
/// `HostValue::Object` clones the handle, not the contents.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(HostObject),
}

impl HostValue {
    /// Build an object from key/value pairs, preserving their order.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        let object = HostObject::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        HostValue::Object(object)
    }

    /// Deep-copy a JSON document into a fresh host graph.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(*b),
            Value::Number(n) => HostValue::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => HostValue::String(s.clone()),
            Value::Array(items) => HostValue::object(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), HostValue::from_json(item))),
            ),
            Value::Object(map) => HostValue::object(
                map.iter()
                    .map(|(key, item)| (key.clone(), HostValue::from_json(item))),
            ),
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<HostObject> for HostValue {
    fn from(object: HostObject) -> Self {
        HostValue::Object(object)
    }
}

impl HostNode for HostValue {
    fn identity(&self) -> Option<usize> {
        self.as_object().map(HostObject::identity)
    }

    fn is_object(&self) -> bool {
        matches!(self, HostValue::Object(_))
    }

    fn is_truthy(&self) -> bool {
        match self {
            HostValue::Null => false,
            HostValue::Bool(b) => *b,
            HostValue::Number(n) => *n != 0.0 && !n.is_nan(),
            HostValue::String(s) => !s.is_empty(),
            HostValue::Object(_) => true,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        match self {
            HostValue::Object(object) => object.try_keys(),
            _ => Ok(Vec::new()),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Self>> {
        match self {
            HostValue::Object(object) => object.try_get(key),
            _ => Ok(None),
        }
    }
}

/// Shared handle to a mutable, ordered property bag.
#[derive(Clone, Default)]
pub struct HostObject {
    entries: Arc<RwLock<Vec<(String, HostValue)>>>,
}

impl HostObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the shared allocation; equal for every clone of the handle.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.entries) as *const () as usize
    }

    /// Insert or replace a property. Replacing keeps the original position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<HostValue>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn remove(&self, key: &str) -> Option<HostValue> {
        let mut entries = self.write();
        let index = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.try_get(key).ok().flatten()
    }

    pub fn len(&self) -> usize {
        self.try_keys().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.iter().map(|(k, _)| k.clone()).collect())
    }

    fn try_get(&self, key: &str) -> Result<Option<HostValue>> {
        Ok(self
            .read()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<(String, HostValue)>>> {
        self.entries
            .read()
            .map_err(|_| ScanError::HostAccess(format!("object {:#x} is poisoned", self.identity())))
    }

    // Writers recover from poisoning; a panicked writer leaves a complete Vec behind.
    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, HostValue)>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// Objects may be cyclic, so Debug never descends into them.
impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("identity", &format_args!("{:#x}", self.identity()))
            .field("len", &self.len())
            .finish()
    }
}
