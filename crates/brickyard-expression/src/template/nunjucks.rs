//! Nunjucks-style templates, rendered with minijinja.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::{invalid_template, normalized_context, rewrite_references};
use brickyard_protocols::{BrickError, RuntimeContext};

const TAGS: &[(&str, &str)] = &[("{{", "}}"), ("{%", "%}")];

/// Render a nunjucks template. Undefined values render as empty strings.
pub fn render_nunjucks(
    template: &str,
    ctx: &RuntimeContext,
    autoescape: bool,
) -> Result<String, BrickError> {
    let source = rewrite_references(template, TAGS, &[]);
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_auto_escape_callback(move |_| {
        if autoescape {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env.render_str(&source, normalized_context(ctx))
        .map_err(|e| invalid_template(template, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RuntimeContext {
        RuntimeContext::new()
            .with_var("@input", json!({"name": "Ada", "items": ["x", "y"]}))
            .with_var("@page-title", json!("<Home>"))
    }

    #[test]
    fn test_render_references() {
        let out = render_nunjucks("Hello {{ @input.name }}", &ctx(), false).unwrap();
        assert_eq!(out, "Hello Ada");
    }

    #[test]
    fn test_hyphenated_keys_and_loops() {
        let out = render_nunjucks(
            "{{ @page-title }}:{% for item in @input.items %}{{ item }}{% endfor %}",
            &ctx(),
            false,
        )
        .unwrap();
        assert_eq!(out, "<Home>:xy");
    }

    #[test]
    fn test_autoescape() {
        let out = render_nunjucks("{{ @page-title }}", &ctx(), true).unwrap();
        assert_eq!(out, "&lt;Home&gt;");
    }

    #[test]
    fn test_undefined_is_empty() {
        let out = render_nunjucks("[{{ @missing.deep }}]", &ctx(), false).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_syntax_error() {
        let err = render_nunjucks("{% if @input %}open", &ctx(), false).unwrap_err();
        let BrickError::InvalidTemplate { template, message } = err else {
            panic!("expected invalid template");
        };
        assert_eq!(template, "{% if @input %}open");
        assert!(!message.contains("(in "));
    }
}
