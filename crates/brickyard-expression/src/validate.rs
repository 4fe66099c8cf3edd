//! JSON Schema validation of brick inputs and outputs.

use serde_json::Value;

use brickyard_protocols::{BrickError, RegistryId};

fn schema_errors(schema: &Value, instance: &Value) -> Vec<String> {
    match jsonschema::validator_for(schema) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .collect(),
        Err(error) => vec![format!("invalid schema: {error}")],
    }
}

/// Validate resolved arguments against a brick's input schema.
///
/// All violations are collected into a single `InputValidation` error.
pub fn validate_input(
    brick_id: &RegistryId,
    schema: &Value,
    args: &Value,
) -> Result<(), BrickError> {
    let errors = schema_errors(schema, args);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BrickError::InputValidation {
            brick_id: brick_id.clone(),
            errors,
        })
    }
}

/// Check a brick's output against its output schema.
///
/// Returns the violations; callers log them rather than failing the stage.
pub fn validate_output(schema: &Value, output: &Value) -> Vec<String> {
    schema_errors(schema, output)
}
