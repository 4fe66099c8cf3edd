//! Declarative brick arguments and tagged expressions.
//!
//! On the wire an expression is an object `{"__type__": kind, "__value__": payload}`.
//! In memory it is a proper sum type so resolvers match exhaustively on it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::pipeline::BrickPipeline;
use crate::error::ConfigValueError;

pub const EXPRESSION_TYPE_KEY: &str = "__type__";
pub const EXPRESSION_VALUE_KEY: &str = "__value__";

/// A brick argument tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ConfigValue {
    /// A primitive (null, bool, number or string).
    Literal(Value),
    Array(Vec<ConfigValue>),
    Object(BTreeMap<String, ConfigValue>),
    Expression(Expression),
}

/// A value requiring resolution against a runtime context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Expression {
    /// Variable path such as `@input.user?.name`.
    Var(String),
    Mustache(String),
    Nunjucks(String),
    Handlebars(String),
    /// Sub-pipeline, only ever run by the interpreter on behalf of a brick.
    Pipeline(PipelineExpression),
    /// Config rendered later by the brick that owns it.
    Defer(Box<ConfigValue>),
}

/// A sub-pipeline nested in a brick's config.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineExpression(pub BrickPipeline);

impl PipelineExpression {
    pub fn new(pipeline: BrickPipeline) -> Self {
        Self(pipeline)
    }

    pub fn pipeline(&self) -> &BrickPipeline {
        &self.0
    }

    /// Parse a pipeline expression out of a resolved argument value.
    pub fn from_value(value: &Value) -> Result<Self, ConfigValueError> {
        match Expression::try_from(value.clone())? {
            Expression::Pipeline(pipeline) => Ok(pipeline),
            other => Err(ConfigValueError(format!(
                "expected a pipeline expression, found '{}'",
                other.kind()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::from(Expression::Pipeline(self.clone()))
    }
}

impl Expression {
    /// The wire tag for this expression.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Var(_) => "var",
            Expression::Mustache(_) => "mustache",
            Expression::Nunjucks(_) => "nunjucks",
            Expression::Handlebars(_) => "handlebars",
            Expression::Pipeline(_) => "pipeline",
            Expression::Defer(_) => "defer",
        }
    }

    /// Whether a value looks like a tagged expression.
    pub fn is_expression_value(value: &Value) -> bool {
        value.as_object().is_some_and(|obj| {
            obj.get(EXPRESSION_TYPE_KEY).is_some_and(Value::is_string)
                && obj.contains_key(EXPRESSION_VALUE_KEY)
        })
    }
}

impl TryFrom<Value> for Expression {
    type Error = ConfigValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut obj) = value else {
            return Err(ConfigValueError("expression must be an object".to_string()));
        };
        let kind = match obj.remove(EXPRESSION_TYPE_KEY) {
            Some(Value::String(kind)) => kind,
            _ => {
                return Err(ConfigValueError(format!(
                    "expression is missing a string {EXPRESSION_TYPE_KEY}"
                )));
            }
        };
        let payload = obj.remove(EXPRESSION_VALUE_KEY).ok_or_else(|| {
            ConfigValueError(format!("'{kind}' expression is missing {EXPRESSION_VALUE_KEY}"))
        })?;

        let text = |payload: Value| match payload {
            Value::String(s) => Ok(s),
            other => Err(ConfigValueError(format!(
                "'{kind}' expression expects a string, found {other}"
            ))),
        };

        match kind.as_str() {
            "var" => Ok(Expression::Var(text(payload)?)),
            "mustache" => Ok(Expression::Mustache(text(payload)?)),
            "nunjucks" => Ok(Expression::Nunjucks(text(payload)?)),
            "handlebars" => Ok(Expression::Handlebars(text(payload)?)),
            "pipeline" => {
                let pipeline: BrickPipeline = match payload {
                    Value::Null => Vec::new(),
                    other => serde_json::from_value(other)
                        .map_err(|e| ConfigValueError(format!("invalid pipeline: {e}")))?,
                };
                Ok(Expression::Pipeline(PipelineExpression(pipeline)))
            }
            "defer" => Ok(Expression::Defer(Box::new(ConfigValue::try_from(payload)?))),
            other => Err(ConfigValueError(format!("unknown expression type '{other}'"))),
        }
    }
}

impl From<Expression> for Value {
    fn from(expression: Expression) -> Self {
        let kind = expression.kind();
        let payload = match expression {
            Expression::Var(s)
            | Expression::Mustache(s)
            | Expression::Nunjucks(s)
            | Expression::Handlebars(s) => Value::String(s),
            Expression::Pipeline(PipelineExpression(pipeline)) => {
                serde_json::to_value(pipeline).unwrap_or(Value::Array(Vec::new()))
            }
            Expression::Defer(inner) => Value::from(*inner),
        };
        let mut obj = Map::new();
        obj.insert(EXPRESSION_TYPE_KEY.to_string(), Value::String(kind.to_string()));
        obj.insert(EXPRESSION_VALUE_KEY.to_string(), payload);
        Value::Object(obj)
    }
}

impl ConfigValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        ConfigValue::Literal(value.into())
    }

    pub fn var(path: impl Into<String>) -> Self {
        ConfigValue::Expression(Expression::Var(path.into()))
    }

    pub fn mustache(template: impl Into<String>) -> Self {
        ConfigValue::Expression(Expression::Mustache(template.into()))
    }

    pub fn nunjucks(template: impl Into<String>) -> Self {
        ConfigValue::Expression(Expression::Nunjucks(template.into()))
    }

    pub fn handlebars(template: impl Into<String>) -> Self {
        ConfigValue::Expression(Expression::Handlebars(template.into()))
    }

    pub fn pipeline(pipeline: BrickPipeline) -> Self {
        ConfigValue::Expression(Expression::Pipeline(PipelineExpression(pipeline)))
    }

    pub fn defer(inner: ConfigValue) -> Self {
        ConfigValue::Expression(Expression::Defer(Box::new(inner)))
    }

    /// Build a config tree from a plain JSON value, recognising tagged expressions.
    pub fn from_json(value: Value) -> Result<Self, ConfigValueError> {
        Self::try_from(value)
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            ConfigValue::Expression(expression) => Some(expression),
            _ => None,
        }
    }

    pub fn as_pipeline(&self) -> Option<&PipelineExpression> {
        match self {
            ConfigValue::Expression(Expression::Pipeline(pipeline)) => Some(pipeline),
            _ => None,
        }
    }

    /// Whether any node in this tree requires resolution.
    pub fn contains_expressions(&self) -> bool {
        match self {
            ConfigValue::Literal(_) => false,
            ConfigValue::Array(items) => items.iter().any(ConfigValue::contains_expressions),
            ConfigValue::Object(entries) => entries.values().any(ConfigValue::contains_expressions),
            ConfigValue::Expression(_) => true,
        }
    }

    /// Visit every sub-pipeline in this tree (not descending into the sub-pipelines).
    pub fn pipelines(&self) -> Vec<&PipelineExpression> {
        let mut out = Vec::new();
        self.collect_pipelines(&mut out);
        out
    }

    fn collect_pipelines<'a>(&'a self, out: &mut Vec<&'a PipelineExpression>) {
        match self {
            ConfigValue::Literal(_) => {}
            ConfigValue::Array(items) => items.iter().for_each(|item| item.collect_pipelines(out)),
            ConfigValue::Object(entries) => {
                entries.values().for_each(|entry| entry.collect_pipelines(out))
            }
            ConfigValue::Expression(Expression::Pipeline(pipeline)) => out.push(pipeline),
            ConfigValue::Expression(Expression::Defer(inner)) => inner.collect_pipelines(out),
            ConfigValue::Expression(_) => {}
        }
    }

    /// Mutable counterpart of [`ConfigValue::pipelines`].
    pub fn pipelines_mut(&mut self) -> Vec<&mut PipelineExpression> {
        let mut out = Vec::new();
        self.collect_pipelines_mut(&mut out);
        out
    }

    fn collect_pipelines_mut<'a>(&'a mut self, out: &mut Vec<&'a mut PipelineExpression>) {
        match self {
            ConfigValue::Literal(_) => {}
            ConfigValue::Array(items) => {
                items.iter_mut().for_each(|item| item.collect_pipelines_mut(out))
            }
            ConfigValue::Object(entries) => entries
                .values_mut()
                .for_each(|entry| entry.collect_pipelines_mut(out)),
            ConfigValue::Expression(Expression::Pipeline(pipeline)) => out.push(pipeline),
            ConfigValue::Expression(Expression::Defer(inner)) => inner.collect_pipelines_mut(out),
            ConfigValue::Expression(_) => {}
        }
    }
}

impl TryFrom<Value> for ConfigValue {
    type Error = ConfigValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if Expression::is_expression_value(&value) {
            return Ok(ConfigValue::Expression(Expression::try_from(value)?));
        }
        match value {
            Value::Array(items) => Ok(ConfigValue::Array(
                items
                    .into_iter()
                    .map(ConfigValue::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            Value::Object(entries) => Ok(ConfigValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| Ok((key, ConfigValue::try_from(value)?)))
                    .collect::<Result<_, ConfigValueError>>()?,
            )),
            primitive => Ok(ConfigValue::Literal(primitive)),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(config: ConfigValue) -> Self {
        match config {
            ConfigValue::Literal(value) => value,
            ConfigValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ConfigValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
            ConfigValue::Expression(expression) => Value::from(expression),
        }
    }
}

#[cfg(test)]
#[path = "config_value_tests.rs"]
mod tests;
