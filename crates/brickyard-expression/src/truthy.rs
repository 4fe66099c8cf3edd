//! Condition truthiness.

use serde_json::Value;

const TRUTHY_STRINGS: &[&str] = &["true", "t", "yes", "y", "on", "1"];

/// Whether a resolved condition value counts as true.
///
/// Strings are true only when they spell an affirmative (`"yes"`, `"on"`,
/// ...), so `"false"` and `""` both skip a stage.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let s = s.trim();
            TRUTHY_STRINGS.iter().any(|t| s.eq_ignore_ascii_case(t))
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}
