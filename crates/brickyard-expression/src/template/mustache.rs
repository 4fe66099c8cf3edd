//! Logic-less mustache renderer.
//!
//! Supports variables, unescaped variables (`{{{x}}}` and `{{& x}}`),
//! sections, inverted sections, comments, dotted names and `.`.

use serde_json::Value;

use super::invalid_template;
use brickyard_protocols::BrickError;

#[derive(Debug, PartialEq)]
enum Node {
    Text(String),
    Var { name: String, escape: bool },
    Section { name: String, inverted: bool, children: Vec<Node> },
}

fn parse(template: &str) -> Result<Vec<Node>, String> {
    // Stack of open sections; the root frame has no name.
    let mut stack: Vec<(Option<(String, bool)>, Vec<Node>)> = vec![(None, Vec::new())];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            push(&mut stack, Node::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let (tag, consumed) = if let Some(inner) = after.strip_prefix('{') {
            let end = inner.find("}}}").ok_or("unclosed tag '{{{'")?;
            (format!("&{}", &inner[..end]), 1 + end + 3)
        } else {
            let end = after.find("}}").ok_or("unclosed tag '{{'")?;
            (after[..end].to_string(), end + 2)
        };
        rest = &after[consumed..];

        let tag = tag.trim();
        let (sigil, name) = match tag.chars().next() {
            Some(c @ ('#' | '^' | '/' | '!' | '&')) => (Some(c), tag[1..].trim().to_string()),
            _ => (None, tag.to_string()),
        };
        if name.is_empty() && sigil != Some('!') {
            return Err("empty tag".to_string());
        }
        match sigil {
            Some('!') => {}
            Some('#') | Some('^') => stack.push((Some((name, sigil == Some('^'))), Vec::new())),
            Some('/') => {
                let (open, children) = match stack.pop() {
                    Some((Some(open), children)) => (open, children),
                    _ => return Err(format!("unopened section '{name}'")),
                };
                if open.0 != name {
                    return Err(format!("unclosed section '{}' at '{name}'", open.0));
                }
                push(
                    &mut stack,
                    Node::Section {
                        name: open.0,
                        inverted: open.1,
                        children,
                    },
                );
            }
            Some('&') => push(&mut stack, Node::Var { name, escape: false }),
            _ => push(&mut stack, Node::Var { name, escape: true }),
        }
    }
    if !rest.is_empty() {
        push(&mut stack, Node::Text(rest.to_string()));
    }

    match stack.pop() {
        Some((None, nodes)) if stack.is_empty() => Ok(nodes),
        Some((Some((name, _)), _)) => Err(format!("unclosed section '{name}'")),
        _ => Err("malformed template".to_string()),
    }
}

fn push(stack: &mut [(Option<(String, bool)>, Vec<Node>)], node: Node) {
    if let Some((_, nodes)) = stack.last_mut() {
        nodes.push(node);
    }
}

/// Find a name on the context stack, innermost frame first.
fn lookup<'v>(stack: &[&'v Value], name: &str) -> Option<&'v Value> {
    if name == "." {
        return stack.last().copied();
    }
    let mut parts = name.split('.');
    let first = parts.next()?;
    let mut value = stack
        .iter()
        .rev()
        .find_map(|frame| frame.as_object().and_then(|obj| obj.get(first)))?;
    for part in parts {
        value = match value {
            Value::Object(obj) => obj.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// String form of a value as it appears in rendered text.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
    out
}

fn render_nodes(nodes: &[Node], stack: &mut Vec<&Value>, autoescape: bool, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var { name, escape } => {
                let text = lookup(stack, name).map(display).unwrap_or_default();
                if *escape && autoescape {
                    out.push_str(&escape_html(&text));
                } else {
                    out.push_str(&text);
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(stack, name);
                let falsy = value.is_none_or(is_falsy);
                if *inverted {
                    if falsy {
                        render_nodes(children, stack, autoescape, out);
                    }
                    continue;
                }
                let Some(value) = value.filter(|_| !falsy) else {
                    continue;
                };
                match value {
                    Value::Array(items) => {
                        for item in items {
                            stack.push(item);
                            render_nodes(children, stack, autoescape, out);
                            stack.pop();
                        }
                    }
                    other => {
                        stack.push(other);
                        render_nodes(children, stack, autoescape, out);
                        stack.pop();
                    }
                }
            }
        }
    }
}

/// Render a mustache template against a JSON context.
pub fn render_mustache(template: &str, ctx: &Value, autoescape: bool) -> Result<String, BrickError> {
    let nodes = parse(template).map_err(|message| invalid_template(template, message))?;
    let mut out = String::with_capacity(template.len());
    let mut stack = vec![ctx];
    render_nodes(&nodes, &mut stack, autoescape, &mut out);
    Ok(out)
}
