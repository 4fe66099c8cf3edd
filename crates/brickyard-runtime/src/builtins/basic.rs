//! Data and signalling bricks.

use async_trait::async_trait;
use brickyard_protocols::{
    BrickArgs, BrickCore, BrickDefinition, BrickError, BrickOptions, Effect, RegistryId,
    Transformer,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{schema_of, CANCEL, ECHO, ERROR, IDENTITY};

/// Returns its arguments unchanged.
pub struct IdentityBrick {
    definition: BrickDefinition,
}

impl IdentityBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(IDENTITY),
                "Identity",
                "Return the arguments unchanged",
            ),
        }
    }
}

impl Default for IdentityBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for IdentityBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    async fn is_pure(&self) -> bool {
        true
    }
}

#[async_trait]
impl Transformer for IdentityBrick {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        Ok(args.into_value())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoArgs {
    /// The message to return.
    message: String,
}

/// Returns `{message}`.
pub struct EchoBrick {
    definition: BrickDefinition,
}

impl EchoBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(ECHO),
                "Echo",
                "Return the message it was given",
            )
            .with_input_schema(schema_of::<EchoArgs>())
            .with_output_schema(json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            })),
        }
    }
}

impl Default for EchoBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for EchoBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    async fn is_pure(&self) -> bool {
        true
    }
}

#[async_trait]
impl Transformer for EchoBrick {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        let EchoArgs { message } = args.deserialize()?;
        Ok(json!({ "message": message }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ErrorArgs {
    /// Error message shown to the user.
    #[serde(default)]
    message: Option<String>,
}

/// Fails the stage with a business error.
///
/// Stays usable in every pipeline flavor.
pub struct ErrorBrick {
    definition: BrickDefinition,
}

impl ErrorBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(ERROR),
                "Raise Error",
                "Stop the pipeline with an error message",
            )
            .with_input_schema(schema_of::<ErrorArgs>()),
        }
    }
}

impl Default for ErrorBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for ErrorBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Effect for ErrorBrick {
    async fn effect(&self, args: BrickArgs, _options: BrickOptions) -> Result<(), BrickError> {
        let ErrorArgs { message } = args.deserialize()?;
        Err(BrickError::Business(
            message.unwrap_or_else(|| "Error".to_string()),
        ))
    }
}

/// Cancels the run it is part of.
pub struct CancelBrick {
    definition: BrickDefinition,
}

impl CancelBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(CANCEL),
                "Cancel Run",
                "Stop the pipeline without reporting an error",
            ),
        }
    }
}

impl Default for CancelBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for CancelBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Effect for CancelBrick {
    async fn effect(&self, _args: BrickArgs, options: BrickOptions) -> Result<(), BrickError> {
        options.logger.info("Run cancelled by pipeline");
        options.abort.abort();
        Err(BrickError::Cancelled)
    }
}
