//! Template engines.
//!
//! All engines render to a string and report failures as
//! [`BrickError::InvalidTemplate`] carrying the offending template.

mod hbs;
mod mustache;
mod nunjucks;

pub use hbs::render_handlebars;
pub use mustache::render_mustache;
pub use nunjucks::render_nunjucks;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use brickyard_protocols::{BrickError, RuntimeContext};

static MESSAGE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\((?:unknown path|in [^)]*)\)").expect("valid noise regex")
});

static AT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w@.])@([A-Za-z_]\w*(?:-\w+)*)").expect("valid reference regex")
});

pub(crate) fn invalid_template(template: &str, message: impl AsRef<str>) -> BrickError {
    BrickError::InvalidTemplate {
        template: template.to_string(),
        message: MESSAGE_NOISE
            .replace_all(message.as_ref(), "")
            .trim()
            .to_string(),
    }
}

/// Context keys as identifier-friendly names: `@` stripped, `-` as `_`.
pub(crate) fn normalized_context(ctx: &RuntimeContext) -> Map<String, Value> {
    ctx.iter()
        .map(|(key, value)| (normalize_key(key), value.clone()))
        .collect()
}

fn normalize_key(key: &str) -> String {
    key.strip_prefix('@').unwrap_or(key).replace('-', "_")
}

/// Rewrite `@name` references inside template tags to normalized names.
///
/// Only text between `open` and `close` is touched; names in `keep` are left
/// as they are.
pub(crate) fn rewrite_references(
    template: &str,
    tags: &[(&str, &str)],
    keep: &[&str],
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = tags
            .iter()
            .filter_map(|(open, close)| rest.find(open).map(|i| (i, *open, *close)))
            .min_by_key(|(i, _, _)| *i);
        let Some((start, open, close)) = next else {
            out.push_str(rest);
            return out;
        };
        let body_start = start + open.len();
        let Some(len) = rest[body_start..].find(close) else {
            out.push_str(rest);
            return out;
        };
        let body = &rest[body_start..body_start + len];
        out.push_str(&rest[..body_start]);
        out.push_str(&AT_REFERENCE.replace_all(body, |caps: &regex::Captures<'_>| {
            let name = &caps[2];
            if keep.contains(&name) {
                format!("{}@{}", &caps[1], name)
            } else {
                format!("{}{}", &caps[1], name.replace('-', "_"))
            }
        }));
        out.push_str(close);
        rest = &rest[body_start + len + close.len()..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rewrite_references_only_inside_tags() {
        let out = rewrite_references(
            "mail me@home.org {{ @input.name }} {% if @my-flag %}x{% endif %}",
            &[("{{", "}}"), ("{%", "%}")],
            &[],
        );
        assert_eq!(out, "mail me@home.org {{ input.name }} {% if my_flag %}x{% endif %}");
    }

    #[test]
    fn test_rewrite_keeps_data_variables() {
        let out = rewrite_references("{{#each @items}}{{@index}}{{/each}}", &[("{{", "}}")], &["index"]);
        assert_eq!(out, "{{#each items}}{{@index}}{{/each}}");
    }

    #[test]
    fn test_rewrite_unclosed_tag_left_alone() {
        assert_eq!(rewrite_references("{{ @a", &[("{{", "}}")], &[]), "{{ @a");
    }

    #[test]
    fn test_normalized_context() {
        let ctx = RuntimeContext::new()
            .with_var("@input", json!(1))
            .with_var("@my-key", json!(2));
        let map = normalized_context(&ctx);
        assert_eq!(map["input"], 1);
        assert_eq!(map["my_key"], 2);
    }

    #[test]
    fn test_invalid_template_strips_noise() {
        let err = invalid_template("{{", "syntax error: unexpected end of input (in <string>:1)");
        let BrickError::InvalidTemplate { template, message } = err else {
            panic!("expected invalid template");
        };
        assert_eq!(template, "{{");
        assert_eq!(message, "syntax error: unexpected end of input");
    }
}
