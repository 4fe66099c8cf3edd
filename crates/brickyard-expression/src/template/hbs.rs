//! Handlebars templates.

use ::handlebars::{no_escape, Handlebars};

use super::{invalid_template, normalized_context, rewrite_references};
use brickyard_protocols::{BrickError, RuntimeContext};

/// Handlebars data variables, which keep their `@`.
const DATA_VARIABLES: &[&str] = &["index", "key", "first", "last", "root"];

/// Render a handlebars template.
pub fn render_handlebars(
    template: &str,
    ctx: &RuntimeContext,
    autoescape: bool,
) -> Result<String, BrickError> {
    let source = rewrite_references(template, &[("{{", "}}")], DATA_VARIABLES);
    let mut registry = Handlebars::new();
    if !autoescape {
        registry.register_escape_fn(no_escape);
    }
    registry
        .render_template(&source, &normalized_context(ctx))
        .map_err(|e| invalid_template(template, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RuntimeContext {
        RuntimeContext::new().with_var(
            "@input",
            json!({"name": "Ada", "html": "<i>", "items": ["x", "y"]}),
        )
    }

    #[test]
    fn test_render_references() {
        assert_eq!(
            render_handlebars("Hi {{ @input.name }}", &ctx(), false).unwrap(),
            "Hi Ada"
        );
    }

    #[test]
    fn test_each_keeps_data_variables() {
        let out = render_handlebars(
            "{{#each @input.items}}{{@index}}={{this}};{{/each}}",
            &ctx(),
            false,
        )
        .unwrap();
        assert_eq!(out, "0=x;1=y;");
    }

    #[test]
    fn test_escape_toggle() {
        assert_eq!(render_handlebars("{{@input.html}}", &ctx(), false).unwrap(), "<i>");
        assert_eq!(render_handlebars("{{@input.html}}", &ctx(), true).unwrap(), "&lt;i&gt;");
    }

    #[test]
    fn test_invalid_template() {
        let err = render_handlebars("{{#if @input}}never closed", &ctx(), false).unwrap_err();
        assert!(matches!(err, BrickError::InvalidTemplate { .. }));
    }
}
