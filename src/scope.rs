//! The session context object and its value model
//!
//! A `Scope` is the explicit stand-in for "the caller's local variables":
//! an ordered name→value map the application passes into save/load and
//! gets back updated. Values carry a capability tag decided at insertion
//! time, so eligibility and encodability are properties of the entry
//! rather than runtime type inspection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;

/// A value bound in a scope, tagged by what kind of thing it is.
///
/// Only `Data` can ever reach a snapshot file. `Callable`, `Module` and
/// `Logger` are filtered out by eligibility; `Opaque` marks a live
/// resource (open handle, generator, connection) that is visible in the
/// scope but cannot be serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    /// Plain serializable data.
    Data(Value),
    /// A function, method or type object. Never persisted.
    Callable(String),
    /// An imported module handle. Never persisted.
    Module(String),
    /// A logging-facility handle. Never persisted.
    Logger(String),
    /// A live resource that cannot be encoded; the label describes it.
    Opaque(String),
}

impl VarValue {
    /// Build a `Data` value from anything serde can serialize.
    pub fn data<T: Serialize>(value: T) -> Result<Self, SnapshotError> {
        let value = serde_json::to_value(value).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        Ok(VarValue::Data(value))
    }

    /// The serializable payload, if this is a `Data` value.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            VarValue::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Short tag used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VarValue::Data(_) => "data",
            VarValue::Callable(_) => "callable",
            VarValue::Module(_) => "module",
            VarValue::Logger(_) => "logger",
            VarValue::Opaque(_) => "opaque",
        }
    }
}

/// The in-memory name→value mapping written to a snapshot file.
///
/// Transparent over a `BTreeMap` so the on-disk shape is exactly a
/// name→value object and iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub entries: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names stored in the snapshot, in map order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Read/write access to a set of name→value bindings.
///
/// `Scope` is the standard implementation; tests substitute accessors
/// that reject writes to exercise per-item bind-failure isolation.
pub trait ScopeAccessor {
    /// Snapshot view of every current binding.
    fn read(&self) -> BTreeMap<String, VarValue>;

    /// Create or replace a single binding.
    fn write(&mut self, name: &str, value: VarValue) -> Result<(), SnapshotError>;
}

/// An ordered collection of named session variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: BTreeMap<String, VarValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind serializable data under `name`.
    pub fn define<T: Serialize>(&mut self, name: &str, value: T) -> Result<(), SnapshotError> {
        let value = VarValue::data(value)?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind an already-tagged value under `name`.
    pub fn insert(&mut self, name: &str, value: VarValue) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<VarValue> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VarValue)> {
        self.vars.iter()
    }

    /// Build a scope from a JSON object, tagging every member as `Data`.
    ///
    /// This is the CLI entry path: a scope file is a plain JSON object.
    pub fn from_json(value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(map) = value else {
            return Err(SnapshotError::Decode(
                "scope must be a JSON object of name → value".to_string(),
            ));
        };
        let mut scope = Scope::new();
        for (name, value) in map {
            scope.insert(&name, VarValue::Data(value));
        }
        Ok(scope)
    }

    /// The `Data` bindings as a JSON object; tagged non-data values are
    /// not representable in a scope file and are left out.
    pub fn to_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .vars
            .iter()
            .filter_map(|(name, value)| value.as_data().map(|v| (name.clone(), v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl ScopeAccessor for Scope {
    fn read(&self) -> BTreeMap<String, VarValue> {
        self.vars.clone()
    }

    fn write(&mut self, name: &str, value: VarValue) -> Result<(), SnapshotError> {
        self.vars.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_define_and_get() {
        let mut scope = Scope::new();
        scope.define("a", 1).unwrap();
        scope.define("b", vec![2, 3]).unwrap();
        assert_eq!(scope.get("a"), Some(&VarValue::Data(json!(1))));
        assert_eq!(scope.get("b"), Some(&VarValue::Data(json!([2, 3]))));
        assert!(scope.get("c").is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Scope::from_json(json!([1, 2])).is_err());
        assert!(Scope::from_json(json!("x")).is_err());
    }

    #[test]
    fn test_to_json_skips_tagged_values() {
        let mut scope = Scope::new();
        scope.define("a", 1).unwrap();
        scope.insert("f", VarValue::Callable("f()".to_string()));
        scope.insert("gen", VarValue::Opaque("open generator".to_string()));
        assert_eq!(scope.to_json(), json!({ "a": 1 }));
    }

    #[test]
    fn test_snapshot_is_transparent_json_object() {
        let mut snapshot = Snapshot::default();
        snapshot.entries.insert("x".to_string(), json!(2));
        let text = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(text, r#"{"x":2}"#);
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }
}
