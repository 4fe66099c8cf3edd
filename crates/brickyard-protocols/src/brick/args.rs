//! Resolved brick arguments.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BrickError;
use crate::types::{ConfigValue, PipelineExpression};

/// Arguments handed to a brick after expression resolution.
///
/// Sub-pipelines and deferred expressions stay in their wire form so that the
/// brick decides when to run or render them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BrickArgs(Map<String, Value>);

impl BrickArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build arguments from a resolved value. `null` is treated as no arguments.
    pub fn from_value(value: Value) -> Result<Self, BrickError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(BrickError::execution(format!(
                "brick arguments must be an object, found {other}"
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// A sub-pipeline argument. A missing or null key is an empty pipeline.
    pub fn pipeline(&self, key: &str) -> Result<PipelineExpression, BrickError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(PipelineExpression::default()),
            Some(value) => PipelineExpression::from_value(value).map_err(|e| {
                BrickError::execution(format!("argument '{key}' is not a pipeline: {}", e.0))
            }),
        }
    }

    /// A deferred expression argument, unwrapped to its inner config.
    pub fn deferred(&self, key: &str) -> Result<Option<ConfigValue>, BrickError> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        let config = ConfigValue::from_json(value.clone())
            .map_err(|e| BrickError::execution(format!("argument '{key}': {}", e.0)))?;
        Ok(Some(match config {
            ConfigValue::Expression(crate::types::Expression::Defer(inner)) => *inner,
            other => other,
        }))
    }

    /// Deserialize the arguments into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BrickError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for BrickArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let args = BrickArgs::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(args.get_str("message"), Some("hi"));
        assert!(BrickArgs::from_value(Value::Null).unwrap().as_map().is_empty());
        assert!(BrickArgs::from_value(json!([1])).is_err());
    }

    #[test]
    fn test_pipeline_argument() {
        let args = BrickArgs::new().with(
            "body",
            json!({"__type__": "pipeline", "__value__": [{"id": "@brickyard/identity"}]}),
        );
        assert_eq!(args.pipeline("body").unwrap().pipeline().len(), 1);
        assert!(args.pipeline("missing").unwrap().pipeline().is_empty());

        let bad = BrickArgs::new().with("body", "not a pipeline");
        assert!(bad.pipeline("body").is_err());
    }

    #[test]
    fn test_deferred_argument() {
        let args = BrickArgs::new().with(
            "label",
            json!({"__type__": "defer", "__value__": {"__type__": "var", "__value__": "@item"}}),
        );
        let inner = args.deferred("label").unwrap().unwrap();
        assert_eq!(inner, ConfigValue::var("@item"));
        assert!(args.deferred("other").unwrap().is_none());
    }

    #[test]
    fn test_deserialize_typed() {
        #[derive(Deserialize)]
        struct EchoArgs {
            message: String,
        }
        let args = BrickArgs::new().with("message", "hello");
        let typed: EchoArgs = args.deserialize().unwrap();
        assert_eq!(typed.message, "hello");
        assert!(BrickArgs::new().deserialize::<EchoArgs>().is_err());
    }
}
