//! Mutually-exclusive class toggling.

use async_trait::async_trait;
use brickyard_protocols::{
    BrickArgs, BrickCore, BrickDefinition, BrickError, BrickOptions, RegistryId, Transformer,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{schema_of, TOGGLE_CLASS};

/// Toggle `value` within a group of mutually-exclusive options.
///
/// If `value` is already present it is removed. Otherwise every other member
/// of `group` is removed and `value` is appended. Classes outside the group
/// keep their order.
pub fn toggle_exclusive_option(classes: &[String], group: &[String], value: &str) -> Vec<String> {
    if classes.iter().any(|c| c == value) {
        return classes.iter().filter(|c| *c != value).cloned().collect();
    }
    let mut next: Vec<String> = classes
        .iter()
        .filter(|c| !group.iter().any(|g| g == *c))
        .cloned()
        .collect();
    next.push(value.to_string());
    next
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ToggleArgs {
    /// Space-separated class list.
    #[serde(default)]
    classes: String,
    /// The mutually-exclusive group.
    #[serde(default)]
    options: Vec<String>,
    /// The option to toggle.
    value: String,
}

/// Returns `{classes}` with one option of an exclusive group toggled.
pub struct ToggleClassBrick {
    definition: BrickDefinition,
}

impl ToggleClassBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(TOGGLE_CLASS),
                "Toggle Class",
                "Toggle a class within a group of mutually-exclusive classes",
            )
            .with_input_schema(schema_of::<ToggleArgs>()),
        }
    }
}

impl Default for ToggleClassBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for ToggleClassBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    async fn is_pure(&self) -> bool {
        true
    }
}

#[async_trait]
impl Transformer for ToggleClassBrick {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        let args: ToggleArgs = args.deserialize()?;
        let classes: Vec<String> = args.classes.split_whitespace().map(str::to_string).collect();
        let toggled = toggle_exclusive_option(&classes, &args.options, &args.value);
        Ok(json!({"classes": toggled.join(" ")}))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::options;
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_toggle_exclusive_option() {
        let group = strings(&["btn-sm", "btn-lg"]);
        let cases: &[(&[&str], &str, &[&str])] = &[
            (&["btn", "btn-sm"], "btn-lg", &["btn", "btn-lg"]),
            (&["btn", "btn-lg"], "btn-lg", &["btn"]),
            (&["btn"], "btn-sm", &["btn", "btn-sm"]),
            (&[], "btn-sm", &["btn-sm"]),
            (&["btn-sm", "active", "btn-lg"], "btn-lg", &["btn-sm", "active"]),
        ];
        for (classes, value, expected) in cases {
            assert_eq!(
                toggle_exclusive_option(&strings(classes), &group, value),
                strings(expected),
                "toggling {value} in {classes:?}"
            );
        }
    }

    #[test]
    fn test_toggle_twice_is_identity_without_group_members() {
        let group = strings(&["a", "b"]);
        let start = strings(&["x", "y"]);
        let once = toggle_exclusive_option(&start, &group, "a");
        assert_eq!(toggle_exclusive_option(&once, &group, "a"), start);
    }

    #[tokio::test]
    async fn test_toggle_class_brick() {
        let args = BrickArgs::new()
            .with("classes", "btn  btn-sm")
            .with("options", json!(["btn-sm", "btn-lg"]))
            .with("value", "btn-lg");
        let output = ToggleClassBrick::new().transform(args, options()).await.unwrap();
        assert_eq!(output, json!({"classes": "btn btn-lg"}));
    }
}
