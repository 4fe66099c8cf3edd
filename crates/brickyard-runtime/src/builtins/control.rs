//! Control-flow bricks.
//!
//! These bricks receive their sub-pipelines unresolved and run them through
//! [`PipelineRunner`](brickyard_protocols::PipelineRunner), so every nested
//! stage is rendered, validated and traced like a top-level one.

use async_trait::async_trait;
use brickyard_expression::is_truthy;
use brickyard_protocols::{
    BranchSegment, BrickArgs, BrickCore, BrickDefinition, BrickError, BrickOptions, Effect,
    RegistryId, RuntimeContext, SerializedError, Transformer,
};
use serde_json::{json, Value};

use super::{FOR_EACH, IF_ELSE, MAP, RUN, RUN_IN_ALL_FRAMES, TRY_EXCEPT};

fn pipeline_property(description: &str) -> Value {
    json!({"type": ["object", "null"], "description": description})
}

/// Variable name for a brick-provided key, accepting `name` or `@name`.
fn variable(key: &str) -> String {
    format!("@{}", key.strip_prefix('@').unwrap_or(key))
}

/// The `elements` argument; missing or null is an empty list.
fn elements(args: &BrickArgs) -> Result<Vec<Value>, BrickError> {
    match args.get("elements") {
        Some(Value::Array(elements)) => Ok(elements.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(BrickError::execution(format!(
            "elements must be an array, found {other}"
        ))),
    }
}

/// Runs one of two branches depending on a condition.
pub struct IfElseBrick {
    definition: BrickDefinition,
}

impl IfElseBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(IF_ELSE),
                "If-Else",
                "Run one of two pipelines based on a condition",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "condition": {"description": "Any value; evaluated for truthiness"},
                    "if": pipeline_property("Pipeline run when the condition is truthy"),
                    "else": pipeline_property("Pipeline run when the condition is falsy")
                }
            })),
        }
    }
}

impl Default for IfElseBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for IfElseBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Transformer for IfElseBrick {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let condition = args.get("condition").is_some_and(is_truthy);
        let key = if condition { "if" } else { "else" };
        let pipeline = args.pipeline(key)?;
        options.logger.debug(&format!("Condition is {condition}, running '{key}'"));
        options
            .runner
            .run_pipeline(&pipeline, BranchSegment::new(key, 0), RuntimeContext::new(), None)
            .await
    }
}

/// Runs a body once per element, in order.
pub struct ForEachBrick {
    definition: BrickDefinition,
}

impl ForEachBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(FOR_EACH),
                "For-Each Loop",
                "Run a pipeline for each element of a list",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "elements": {"type": "array", "description": "The elements to loop over"},
                    "elementKey": {
                        "type": "string",
                        "default": "element",
                        "description": "Variable the current element is bound to"
                    },
                    "body": pipeline_property("Pipeline run for each element")
                },
                "required": ["elements"]
            })),
        }
    }
}

impl Default for ForEachBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for ForEachBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Transformer for ForEachBrick {
    /// Returns the output of the last iteration, or null for an empty list.
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let elements = elements(&args)?;
        let key = variable(args.get_str("elementKey").unwrap_or("element"));
        let body = args.pipeline("body")?;

        let mut last = Value::Null;
        for (index, element) in elements.into_iter().enumerate() {
            let extra = RuntimeContext::new().with_var(key.clone(), element);
            last = options
                .runner
                .run_pipeline(&body, BranchSegment::new("body", index), extra, None)
                .await?;
        }
        Ok(last)
    }
}

/// Renders a deferred config once per element.
///
/// The config is left unrendered when the stage's arguments are rendered and
/// is rendered here with the element bound, under the stage's api version.
pub struct MapBrick {
    definition: BrickDefinition,
}

impl MapBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(MAP),
                "Map",
                "Render a config for each element of a list",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "elements": {"type": "array", "description": "The elements to map"},
                    "elementKey": {
                        "type": "string",
                        "default": "element",
                        "description": "Variable the current element is bound to"
                    },
                    "config": {"description": "Deferred config rendered for each element"}
                },
                "required": ["elements", "config"]
            })),
        }
    }
}

impl Default for MapBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for MapBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Transformer for MapBrick {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let elements = elements(&args)?;
        let key = variable(args.get_str("elementKey").unwrap_or("element"));
        let config = args
            .deferred("config")?
            .ok_or_else(|| BrickError::execution("argument 'config' is required"))?;

        let mut mapped = Vec::with_capacity(elements.len());
        for element in elements {
            options.abort.check()?;
            let extra = RuntimeContext::new().with_var(key.clone(), element);
            mapped.push(options.runner.render_deferred(&config, &extra)?);
        }
        Ok(Value::Array(mapped))
    }
}

/// Runs `try`; on failure runs `except` with the error bound to a variable.
///
/// Cancellation is never caught.
pub struct TryExceptBrick {
    definition: BrickDefinition,
}

impl TryExceptBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(TRY_EXCEPT),
                "Try-Except",
                "Run a pipeline and handle its errors",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "try": pipeline_property("Pipeline to attempt"),
                    "except": pipeline_property("Pipeline run if the attempt fails"),
                    "errorKey": {
                        "type": "string",
                        "default": "error",
                        "description": "Variable the serialized error is bound to"
                    }
                }
            })),
        }
    }
}

impl Default for TryExceptBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for TryExceptBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Transformer for TryExceptBrick {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let attempt = args.pipeline("try")?;
        let handler = args.pipeline("except")?;
        let key = variable(args.get_str("errorKey").unwrap_or("error"));

        match options
            .runner
            .run_pipeline(&attempt, BranchSegment::new("try", 0), RuntimeContext::new(), None)
            .await
        {
            Ok(value) => Ok(value),
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                options.logger.warn(&format!("Caught error: {e}"));
                let error = serde_json::to_value(SerializedError::from(&e))?;
                let extra = RuntimeContext::new().with_var(key, error);
                options
                    .runner
                    .run_pipeline(&handler, BranchSegment::new("except", 0), extra, None)
                    .await
            }
        }
    }
}

/// Runs its body once.
pub struct RunBrick {
    definition: BrickDefinition,
}

impl RunBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(RUN),
                "Run",
                "Run a pipeline and return its output",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {"body": pipeline_property("Pipeline to run")}
            })),
        }
    }
}

impl Default for RunBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for RunBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Transformer for RunBrick {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let body = args.pipeline("body")?;
        options
            .runner
            .run_pipeline(&body, BranchSegment::new("body", 0), RuntimeContext::new(), None)
            .await
    }
}

/// Runs its body in every frame of the current tab.
pub struct RunInAllFramesBrick {
    definition: BrickDefinition,
}

impl RunInAllFramesBrick {
    pub fn new() -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(RUN_IN_ALL_FRAMES),
                "Run in All Frames",
                "Run a pipeline in every frame of the tab; failing frames are ignored",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {"body": pipeline_property("Pipeline to run in each frame")}
            })),
        }
    }
}

impl Default for RunInAllFramesBrick {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrickCore for RunInAllFramesBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }
}

#[async_trait]
impl Effect for RunInAllFramesBrick {
    async fn effect(&self, args: BrickArgs, options: BrickOptions) -> Result<(), BrickError> {
        let body = args.pipeline("body")?;
        let results = options
            .runner
            .run_in_all_frames(&body, BranchSegment::new("body", 0), RuntimeContext::new())
            .await?;
        options
            .logger
            .debug(&format!("Pipeline completed in {} frame(s)", results.len()));
        Ok(())
    }
}
