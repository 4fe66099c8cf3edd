//! Runtime variable context.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Variable holding the payload that started the run.
pub const INPUT_VAR: &str = "@input";
/// Variable holding the mod's option values.
pub const OPTIONS_VAR: &str = "@options";

/// The variables visible to an expression.
///
/// Copy-on-write: extending a context returns a new context and never mutates
/// one that is shared with sibling branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeContext {
    vars: Arc<BTreeMap<String, Value>>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh context for the top of a run.
    pub fn from_input(input: Value, options: Value) -> Self {
        Self::new()
            .with_var(INPUT_VAR, input)
            .with_var(OPTIONS_VAR, options)
    }

    /// Return a context with `key` bound to `value`; `self` is unchanged.
    pub fn with_var(&self, key: impl Into<String>, value: Value) -> Self {
        let mut vars = (*self.vars).clone();
        vars.insert(key.into(), value);
        Self {
            vars: Arc::new(vars),
        }
    }

    /// Return a context with every binding of `other` layered over `self`.
    pub fn extended(&self, other: &RuntimeContext) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        let mut vars = (*self.vars).clone();
        vars.extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            vars: Arc::new(vars),
        }
    }

    /// Layer the keys of an object value over this context.
    ///
    /// Non-object values leave the context unchanged.
    pub fn merged_with_object(&self, value: &Value) -> Self {
        match value {
            Value::Object(obj) if !obj.is_empty() => {
                let mut vars = (*self.vars).clone();
                vars.extend(obj.iter().map(|(k, v)| (k.clone(), v.clone())));
                Self {
                    vars: Arc::new(vars),
                }
            }
            _ => self.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn input(&self) -> Option<&Value> {
        self.get(INPUT_VAR)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Whether two contexts share the same storage.
    pub fn ptr_eq(&self, other: &RuntimeContext) -> bool {
        Arc::ptr_eq(&self.vars, &other.vars)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.vars
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl Serialize for RuntimeContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.vars.serialize(serializer)
    }
}

impl FromIterator<(String, Value)> for RuntimeContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: Arc::new(iter.into_iter().collect()),
        }
    }
}
