//! Variable path resolution.
//!
//! Paths are dotted (`@input.user.name`), may index arrays (`@items.0` or
//! `@items[0]`) and may mark a segment optional with `?.`, in which case a
//! missing value short-circuits to `null` instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use brickyard_protocols::{ContextError, RuntimeContext};

static VAR_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@[A-Za-z_$][\w$-]*(\??\.[\w$-]+|\[\d+\])*$").expect("valid var path regex")
});

/// Whether a string is exactly a variable reference like `@input.name`.
pub fn is_var_path(value: &str) -> bool {
    VAR_PATH.is_match(value.trim())
}

struct Segment<'a> {
    name: &'a str,
    /// Access through this segment short-circuits when it is missing.
    optional: bool,
}

fn parse(path: &str) -> Vec<Segment<'_>> {
    path.split('.')
        .flat_map(|part| {
            let mut out = Vec::new();
            let (head, rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };
            out.push(head);
            out.extend(
                rest.split(['[', ']'])
                    .filter(|s| !s.is_empty()),
            );
            out
        })
        .filter(|s| !s.is_empty())
        .map(|raw| match raw.strip_suffix('?') {
            Some(name) => Segment {
                name,
                optional: true,
            },
            None => Segment {
                name: raw,
                optional: false,
            },
        })
        .collect()
}

fn child<'v>(value: &'v Value, name: &str) -> Option<&'v Value> {
    match value {
        Value::Object(obj) => obj.get(name),
        Value::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn length(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => Some(Value::from(items.len())),
        Value::String(s) => Some(Value::from(s.chars().count())),
        _ => None,
    }
}

/// Resolve a variable path against a context.
///
/// A missing root variable and a non-optional access through a missing or
/// null value are errors. A missing property on an existing value is `null`.
pub fn resolve_path(ctx: &RuntimeContext, path: &str) -> Result<Value, ContextError> {
    let path = path.trim();
    let segments = parse(path);
    let Some((root, rest)) = segments.split_first() else {
        return Ok(Value::Null);
    };

    let mut current = match ctx.get(root.name) {
        Some(value) => value.clone(),
        None if root.optional => return Ok(Value::Null),
        None => return Err(ContextError::new(path, root.name)),
    };

    let mut previous = root;
    for segment in rest {
        if current.is_null() {
            if previous.optional {
                return Ok(Value::Null);
            }
            return Err(ContextError::new(path, previous.name));
        }
        current = match child(&current, segment.name) {
            Some(value) => value.clone(),
            None if segment.name == "length" => length(&current).unwrap_or(Value::Null),
            None => Value::Null,
        };
        previous = segment;
    }
    Ok(current)
}
