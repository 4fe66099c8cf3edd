use super::*;
use serde_json::json;

#[test]
fn test_literal_primitives() {
    assert_eq!(ConfigValue::try_from(json!(42)).unwrap(), ConfigValue::literal(42));
    assert_eq!(ConfigValue::try_from(json!("hi")).unwrap(), ConfigValue::literal("hi"));
    assert_eq!(ConfigValue::try_from(Value::Null).unwrap(), ConfigValue::Literal(Value::Null));
}

#[test]
fn test_var_expression() {
    let value = json!({"__type__": "var", "__value__": "@input.name"});
    let config = ConfigValue::try_from(value.clone()).unwrap();
    assert_eq!(config, ConfigValue::var("@input.name"));
    assert_eq!(Value::from(config), value);
}

#[test]
fn test_template_expressions() {
    for (kind, expected) in [
        ("mustache", ConfigValue::mustache("{{ x }}")),
        ("nunjucks", ConfigValue::nunjucks("{{ x }}")),
        ("handlebars", ConfigValue::handlebars("{{ x }}")),
    ] {
        let parsed = ConfigValue::try_from(json!({"__type__": kind, "__value__": "{{ x }}"})).unwrap();
        assert_eq!(parsed, expected);
    }
}

#[test]
fn test_nested_object_with_expressions() {
    let value = json!({
        "message": {"__type__": "mustache", "__value__": "Hello {{ @input.name }}"},
        "tags": ["a", {"__type__": "var", "__value__": "@tag"}],
        "count": 3
    });
    let config = ConfigValue::try_from(value.clone()).unwrap();
    assert!(config.contains_expressions());
    let ConfigValue::Object(entries) = &config else {
        panic!("expected object");
    };
    assert_eq!(entries["count"], ConfigValue::literal(3));
    assert_eq!(Value::from(config), value);
}

#[test]
fn test_pipeline_expression() {
    let value = json!({
        "__type__": "pipeline",
        "__value__": [{"id": "@brickyard/echo", "config": {"message": "hi"}}]
    });
    let config = ConfigValue::try_from(value).unwrap();
    let pipeline = config.as_pipeline().unwrap();
    assert_eq!(pipeline.pipeline().len(), 1);
    assert_eq!(pipeline.pipeline()[0].id.as_str(), "@brickyard/echo");
}

#[test]
fn test_null_pipeline_is_empty() {
    let config = ConfigValue::try_from(json!({"__type__": "pipeline", "__value__": null})).unwrap();
    assert!(config.as_pipeline().unwrap().pipeline().is_empty());
}

#[test]
fn test_defer_keeps_inner_tree() {
    let value = json!({
        "__type__": "defer",
        "__value__": {"label": {"__type__": "var", "__value__": "@element.text"}}
    });
    let config = ConfigValue::try_from(value.clone()).unwrap();
    let Some(Expression::Defer(inner)) = config.as_expression() else {
        panic!("expected defer");
    };
    assert!(inner.contains_expressions());
    assert_eq!(Value::from(config), value);
}

#[test]
fn test_unknown_expression_type_rejected() {
    let err = ConfigValue::try_from(json!({"__type__": "jq", "__value__": "."})).unwrap_err();
    assert!(err.to_string().contains("unknown expression type 'jq'"));
}

#[test]
fn test_template_requires_string() {
    let err = ConfigValue::try_from(json!({"__type__": "var", "__value__": 5})).unwrap_err();
    assert!(err.to_string().contains("expects a string"));
}

#[test]
fn test_object_with_only_type_key_is_literal_object() {
    let config = ConfigValue::try_from(json!({"__type__": "var"})).unwrap();
    assert!(!config.contains_expressions());
}

#[test]
fn test_collect_nested_pipelines() {
    let config = ConfigValue::try_from(json!({
        "if": {"__type__": "pipeline", "__value__": []},
        "else": {"__type__": "pipeline", "__value__": []},
        "other": "x"
    }))
    .unwrap();
    assert_eq!(config.pipelines().len(), 2);
}

#[test]
fn test_pipeline_expression_from_value() {
    let expression = PipelineExpression::default();
    let value = expression.to_value();
    assert_eq!(PipelineExpression::from_value(&value).unwrap(), expression);
    assert!(PipelineExpression::from_value(&json!({"__type__": "var", "__value__": "@x"})).is_err());
}
