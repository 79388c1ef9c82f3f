//! Dirty State Tracking
//!
//! Compares the values of the bound form fields of the detail panel with
//! the entity snapshot they were loaded from.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::models::MethodParameter;

/// Tags the server adds on its own; they never count as user changes
pub const INTERNAL_TAGS: &[&str] = &["core", "ui", "html"];

/// Value of a bound input
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Bool(bool),
    Number(f64),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(list_item).collect()),
            Value::Object(o) => match o.get("id").and_then(Value::as_str) {
                Some(id) => FieldValue::Text(id.to_string()),
                None => FieldValue::Text(value.to_string()),
            },
        }
    }

    /// Value sent to the server; a cleared text field is sent as null
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) if s.is_empty() => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }

    /// Text representation for inputs
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => s == "true",
            _ => false,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

fn list_item(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(o) => o
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Parse a comma separated tag/list input
pub fn parse_list(input: &str) -> FieldValue {
    FieldValue::List(
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn list_set<'a>(key: &str, items: &'a [String]) -> BTreeSet<&'a str> {
    items
        .iter()
        .map(String::as_str)
        .filter(|item| key != "tags" || !INTERNAL_TAGS.contains(item))
        .collect()
}

/// Equality with the detail-panel rules: blank text, null and missing are
/// the same; lists compare as sets; number/bool inputs may arrive as text
pub fn values_equal(key: &str, current: &FieldValue, stored: &FieldValue) -> bool {
    use FieldValue::*;

    match (current, stored) {
        (a, b) if a.is_blank() && b.is_blank() => true,
        (List(a), List(b)) => list_set(key, a) == list_set(key, b),
        (List(a), b) | (b, List(a)) if b.is_blank() => list_set(key, a).is_empty(),
        (Text(t), Number(n)) | (Number(n), Text(t)) => t.trim().parse::<f64>().map(|v| v == *n).unwrap_or(false),
        (Text(t), Bool(b)) | (Bool(b), Text(t)) => t == if *b { "true" } else { "false" },
        (Bool(false), Null) | (Null, Bool(false)) => true,
        (a, b) => a == b,
    }
}

/// Current values of the bound inputs, keyed by property name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    fields: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the given keys and fill them from the snapshot
    pub fn from_snapshot<'a>(keys: impl IntoIterator<Item = &'a str>, snapshot: &Map<String, Value>) -> Self {
        let fields = keys
            .into_iter()
            .map(|key| {
                let value = snapshot.get(key).map(FieldValue::from_json).unwrap_or(FieldValue::Null);
                (key.to_string(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Bound fields whose value differs from the snapshot
pub fn collect(form: &FormState, snapshot: &Map<String, Value>) -> BTreeMap<String, FieldValue> {
    form.iter()
        .filter(|(key, current)| {
            let stored = snapshot.get(*key).map(FieldValue::from_json).unwrap_or(FieldValue::Null);
            !values_equal(key, current, &stored)
        })
        .map(|(key, current)| (key.to_string(), current.clone()))
        .collect()
}

/// Request body for a set of changes
pub fn changes_to_json(changes: &BTreeMap<String, FieldValue>) -> Map<String, Value> {
    changes.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

type DirtyCheck = Box<dyn Fn() -> bool + Send + Sync>;

/// Tracks changed-field markers plus caller supplied dirty predicates
#[derive(Default)]
pub struct DirtyStateTracker {
    changed: BTreeSet<String>,
    checks: Vec<DirtyCheck>,
}

impl DirtyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the markers after an input event
    pub fn update(&mut self, form: &FormState, snapshot: &Map<String, Value>) -> &BTreeSet<String> {
        self.changed = collect(form, snapshot).into_keys().collect();
        &self.changed
    }

    /// Whether a field carries the `has-changes` marker
    pub fn has_changes(&self, key: &str) -> bool {
        self.changed.contains(key)
    }

    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    /// Register an extra predicate for structured sub-forms
    pub fn add_check(&mut self, check: impl Fn() -> bool + Send + Sync + 'static) {
        self.checks.push(Box::new(check));
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty() || self.checks.iter().any(|check| check())
    }

    /// Repopulate every bound field from the snapshot and clear the markers.
    /// Editor contents are bound fields too, so they are re-synced as well.
    pub fn revert(&mut self, form: &FormState, snapshot: &Map<String, Value>) -> FormState {
        let reverted = FormState::from_snapshot(form.keys(), snapshot);
        self.update(&reverted, snapshot);
        reverted
    }
}

/// Parameter list dirtiness: length differs, or a keyed field differs at any index
pub fn parameters_changed(baseline: &[MethodParameter], current: &[MethodParameter]) -> bool {
    fn text(value: &Option<String>) -> FieldValue {
        value.clone().map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }

    if baseline.len() != current.len() {
        return true;
    }
    baseline.iter().zip(current).any(|(old, new)| {
        old.name != new.name
            || old.parameter_type != new.parameter_type
            || !values_equal("description", &text(&new.description), &text(&old.description))
            || !values_equal("exampleValue", &text(&new.example_value), &text(&old.example_value))
    })
}
