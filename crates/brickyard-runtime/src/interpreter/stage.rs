//! Single stage execution.

use std::sync::Arc;
use std::time::Instant;

use brickyard_expression::{evaluate_condition, render_args, validate_input, validate_output};
use brickyard_messenger::{DispatchOptions, DispatchRequest, FrameTarget, RemoteRunOptions};
use brickyard_protocols::{
    ApiVersionOptions, Brick, BrickArgs, BrickConfig, BrickError, BrickLogger, BrickOptions,
    BrickType, CompositeBrick, RendererPayload, Root, RootMode, RuntimeContext, SerializedError,
    TraceRecord, WindowTarget, INPUT_VAR,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::runner::StageRunner;
use super::scope::Scope;
use super::PipelineInterpreter;

/// Output of an executed stage, with the type of the brick that produced it.
pub(crate) type StageOutput = (Value, Option<BrickType>);

/// Everything a trace record needs about one attempt.
struct StageAttempt {
    rendered: Option<Value>,
    brick_type: Option<BrickType>,
    result: Result<Value, BrickError>,
}

impl StageAttempt {
    fn failed(rendered: Option<Value>, brick_type: Option<BrickType>, error: BrickError) -> Self {
        Self {
            rendered,
            brick_type,
            result: Err(error),
        }
    }
}

impl PipelineInterpreter {
    /// Run one stage. Returns `None` when its condition is falsy.
    pub(crate) async fn run_stage(
        &self,
        stage: &BrickConfig,
        index: usize,
        ctx: &RuntimeContext,
        scope: &Scope,
    ) -> Result<Option<StageOutput>, BrickError> {
        let api = scope.api();
        if let Some(condition) = &stage.condition {
            let run = evaluate_condition(condition, ctx, &api)
                .map_err(|e| e.at_stage(stage.id.clone(), index, scope.branches.clone()))?;
            if !run {
                debug!(
                    run_id = %scope.run_id,
                    brick_id = %stage.id,
                    stage_index = index,
                    "Stage skipped"
                );
                return Ok(None);
            }
        }

        debug!(
            run_id = %scope.run_id,
            brick_id = %stage.id,
            stage_index = index,
            branches = ?scope.branches,
            "Running stage {}",
            stage.display_name()
        );
        let started = Instant::now();
        let timestamp = Utc::now();
        let attempt = self.attempt(stage, ctx, scope, &api, None).await;
        self.record(stage, index, ctx, scope, timestamp, started, &attempt)
            .await;

        match attempt.result {
            Ok(value) => Ok(Some((value, attempt.brick_type))),
            Err(e) => Err(e.at_stage(stage.id.clone(), index, scope.branches.clone())),
        }
    }

    /// Run a stage sent by another context with its arguments already
    /// rendered. The sender owns the stage's trace record, so none is written
    /// here; stages of its sub-pipelines are traced as usual.
    pub(crate) async fn run_dispatched(
        &self,
        stage: &BrickConfig,
        ctx: &RuntimeContext,
        scope: &Scope,
        args: Value,
    ) -> Result<Value, BrickError> {
        let api = scope.api();
        self.attempt(stage, ctx, scope, &api, Some(args)).await.result
    }

    async fn attempt(
        &self,
        stage: &BrickConfig,
        ctx: &RuntimeContext,
        scope: &Scope,
        api: &ApiVersionOptions,
        rendered: Option<Value>,
    ) -> StageAttempt {
        let brick = match self.registry.lookup(&stage.id).await {
            Ok(brick) => brick,
            Err(e) => return StageAttempt::failed(None, None, e),
        };
        let brick_type = self.registry.infer(&brick).ok();

        let args = match rendered {
            Some(args) => args,
            None => match render_args(&stage.config, ctx, api) {
                Ok(args) => args,
                Err(e) => return StageAttempt::failed(None, brick_type, e),
            },
        };

        let result = self.invoke(&brick, stage, args.clone(), ctx, scope, api).await;
        StageAttempt {
            rendered: Some(args),
            brick_type,
            result,
        }
    }

    async fn invoke(
        &self,
        brick: &Brick,
        stage: &BrickConfig,
        args: Value,
        ctx: &RuntimeContext,
        scope: &Scope,
        api: &ApiVersionOptions,
    ) -> Result<Value, BrickError> {
        let required = brick.required_capabilities().await;
        let missing = self.platform.missing_capabilities(&required);
        if !missing.is_empty() {
            return Err(BrickError::MissingCapability {
                brick_id: brick.id().clone(),
                missing,
            });
        }

        if api.validate_input {
            validate_input(brick.id(), &brick.definition().input_schema, &args)?;
        }

        if stage.window != WindowTarget::Current {
            return self.dispatch_stage(stage, args, ctx, scope).await;
        }

        let output = match brick {
            Brick::Composite(composite) => self.run_composite(composite, args, scope).await?,
            Brick::Reader(reader) => {
                let options = self.brick_options(brick, stage, ctx, scope).await;
                reader.read(options).await?
            }
            Brick::Transformer(transformer) => {
                let options = self.brick_options(brick, stage, ctx, scope).await;
                transformer
                    .transform(BrickArgs::from_value(args)?, options)
                    .await?
            }
            Brick::Effect(effect) => {
                let options = self.brick_options(brick, stage, ctx, scope).await;
                effect.effect(BrickArgs::from_value(args)?, options).await?;
                Value::Null
            }
            Brick::Renderer(renderer) => {
                let options = self.brick_options(brick, stage, ctx, scope).await;
                let payload = renderer
                    .render(BrickArgs::from_value(args)?, options)
                    .await?;
                render_output(payload, api)
            }
        };

        if self.settings.validate_output {
            if let Some(schema) = &brick.definition().output_schema {
                let errors = validate_output(schema, &output);
                if !errors.is_empty() {
                    warn!(
                        brick_id = %brick.id(),
                        errors = %errors.join("; "),
                        "Brick output does not match its output schema"
                    );
                }
            }
        }

        Ok(output)
    }

    async fn brick_options(
        &self,
        brick: &Brick,
        stage: &BrickConfig,
        ctx: &RuntimeContext,
        scope: &Scope,
    ) -> BrickOptions {
        let root = if brick.is_root_aware().await {
            Some(match stage.root_mode {
                RootMode::Inherit => scope.root.clone().unwrap_or_default(),
                RootMode::Document => Root::Document,
            })
        } else {
            None
        };

        BrickOptions {
            ctxt: ctx.clone(),
            root,
            logger: BrickLogger::new(scope.run_id)
                .with_mod_component(scope.mod_component_id)
                .for_brick(brick.id(), stage.instance_id),
            abort: scope.abort.clone(),
            platform: Arc::clone(&self.platform),
            runner: Arc::new(StageRunner::new(self.clone(), ctx.clone(), scope.clone())),
        }
    }

    /// Composite bricks run in a fresh context where `@input` is their arguments.
    async fn run_composite(
        &self,
        composite: &CompositeBrick,
        args: Value,
        scope: &Scope,
    ) -> Result<Value, BrickError> {
        debug!(
            run_id = %scope.run_id,
            brick_id = %composite.id(),
            api_version = %composite.api_version(),
            "Running composite brick"
        );
        let ctx = RuntimeContext::new().with_var(INPUT_VAR, args.clone());
        self.run_scoped(
            composite.pipeline(),
            ctx,
            args,
            scope.composite(composite.api_version()),
        )
        .await
    }

    /// Run a stage in another frame through the dispatcher.
    async fn dispatch_stage(
        &self,
        stage: &BrickConfig,
        args: Value,
        ctx: &RuntimeContext,
        scope: &Scope,
    ) -> Result<Value, BrickError> {
        let dispatcher = self.dispatcher.as_ref().ok_or_else(|| {
            BrickError::Dispatch(format!(
                "stage {} targets another frame but no dispatcher is configured",
                stage.id
            ))
        })?;
        let target = frame_target(stage.window, scope)?;

        let request = DispatchRequest::new(stage.id.clone(), BrickArgs::from_value(args)?.into_map())
            .with_options(RemoteRunOptions {
                ctxt: ctx.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                api_version: scope.api_version,
                run_id: Some(scope.run_id),
                mod_component_id: scope.mod_component_id,
                branches: scope.branches.clone(),
                frame: None,
            });
        let options = DispatchOptions {
            timeout: self.settings.dispatch_timeout,
            abort: scope.abort.clone(),
        };

        debug!(brick_id = %stage.id, ?target, "Dispatching stage");
        Ok(dispatcher.dispatch(target, &request, &options).await?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        stage: &BrickConfig,
        index: usize,
        ctx: &RuntimeContext,
        scope: &Scope,
        timestamp: DateTime<Utc>,
        started: Instant,
        attempt: &StageAttempt,
    ) {
        let record = TraceRecord {
            run_id: scope.run_id,
            branches: scope.branches.clone(),
            mod_component_id: scope.mod_component_id,
            brick_instance_id: stage.instance_id,
            brick_id: stage.id.clone(),
            stage_index: index,
            timestamp,
            rendered_args: attempt.rendered.clone(),
            template_context: ctx.to_value(),
            output: attempt.result.as_ref().ok().cloned(),
            error: attempt.result.as_ref().err().map(SerializedError::from),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        if let Err(e) = self.trace.append(record).await {
            warn!(run_id = %scope.run_id, error = %e, "Failed to store trace record");
        }
    }
}

/// Renderer output: wrapped as `{kind, content}` unless rendering is explicit.
fn render_output(payload: RendererPayload, api: &ApiVersionOptions) -> Value {
    if !api.explicit_render {
        return payload.into_value();
    }
    match payload {
        RendererPayload::Html(html) => Value::String(html),
        RendererPayload::Document(document) => document,
    }
}

fn frame_target(window: WindowTarget, scope: &Scope) -> Result<FrameTarget, BrickError> {
    let no_frame = || BrickError::Dispatch(format!("window '{window:?}' needs the frame of the run"));
    match window {
        WindowTarget::Current => scope.frame.map(FrameTarget::frame).ok_or_else(no_frame),
        WindowTarget::Opener => scope
            .opener
            .map(FrameTarget::frame)
            .ok_or_else(|| BrickError::Dispatch("run has no opener frame".to_string())),
        WindowTarget::Top => scope
            .frame
            .map(|frame| FrameTarget::top_frame(frame.tab_id))
            .ok_or_else(no_frame),
        WindowTarget::Broadcast => scope
            .frame
            .map(|frame| FrameTarget::all_frames(frame.tab_id))
            .ok_or_else(no_frame),
    }
}
