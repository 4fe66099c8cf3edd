//! Argument rendering.
//!
//! Explicit rendering (v3) resolves tagged expressions and leaves every
//! literal untouched. Implicit rendering (v1/v2) additionally treats bare
//! strings as expressions: a string that is exactly a variable path is a
//! `var`, and a string containing `{{` is a mustache template.
//!
//! Pipeline and defer expressions are never evaluated here. They are
//! returned in wire form so the owning brick decides when to run them.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use brickyard_protocols::{ApiVersionOptions, BrickError, ConfigValue, Expression, RuntimeContext};

use crate::path::{is_var_path, resolve_path};
use crate::template::{render_handlebars, render_mustache, render_nunjucks};
use crate::truthy::is_truthy;

/// Resolve a single expression.
pub fn resolve_expression(
    expression: &Expression,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<Value, BrickError> {
    match expression {
        Expression::Var(path) if path.trim().is_empty() => Ok(Value::Null),
        Expression::Var(path) => Ok(resolve_path(ctx, path)?),
        Expression::Mustache(template) => {
            render_mustache(template, &ctx.to_value(), options.autoescape).map(Value::String)
        }
        Expression::Nunjucks(template) => {
            render_nunjucks(template, ctx, options.autoescape).map(Value::String)
        }
        Expression::Handlebars(template) => {
            render_handlebars(template, ctx, options.autoescape).map(Value::String)
        }
        Expression::Pipeline(_) | Expression::Defer(_) => Ok(Value::from(expression.clone())),
    }
}

/// Render a config tree, resolving only tagged expressions.
pub fn render_explicit(
    config: &ConfigValue,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<Value, BrickError> {
    render_tree(config, ctx, options, false)
}

/// Render a config tree, also interpreting bare strings as expressions.
pub fn render_implicit(
    config: &ConfigValue,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<Value, BrickError> {
    render_tree(config, ctx, options, true)
}

fn render_tree(
    config: &ConfigValue,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
    implicit: bool,
) -> Result<Value, BrickError> {
    match config {
        ConfigValue::Literal(Value::String(s)) if implicit => render_implicit_string(s, ctx, options),
        ConfigValue::Literal(value) => Ok(value.clone()),
        ConfigValue::Array(items) => items
            .iter()
            .map(|item| render_tree(item, ctx, options, implicit))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ConfigValue::Object(entries) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), render_tree(value, ctx, options, implicit)?)))
            .collect::<Result<Map<_, _>, BrickError>>()
            .map(Value::Object),
        ConfigValue::Expression(expression) => resolve_expression(expression, ctx, options),
    }
}

fn render_implicit_string(
    s: &str,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<Value, BrickError> {
    if is_var_path(s) {
        Ok(resolve_path(ctx, s)?)
    } else if s.contains("{{") {
        render_mustache(s, &ctx.to_value(), options.autoescape).map(Value::String)
    } else {
        Ok(Value::String(s.to_string()))
    }
}

/// Render a stage's arguments into an object, choosing explicit or implicit
/// rendering from the api version options.
pub fn render_args(
    config: &BTreeMap<String, ConfigValue>,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<Value, BrickError> {
    config
        .iter()
        .map(|(key, value)| {
            let rendered = if options.explicit_arg {
                render_explicit(value, ctx, options)?
            } else {
                render_implicit(value, ctx, options)?
            };
            Ok((key.clone(), rendered))
        })
        .collect::<Result<Map<_, _>, BrickError>>()
        .map(Value::Object)
}

/// Evaluate a stage condition.
pub fn evaluate_condition(
    condition: &ConfigValue,
    ctx: &RuntimeContext,
    options: &ApiVersionOptions,
) -> Result<bool, BrickError> {
    let value = if options.explicit_arg {
        render_explicit(condition, ctx, options)?
    } else {
        render_implicit(condition, ctx, options)?
    };
    Ok(is_truthy(&value))
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
