//! Sub-pipeline handle for control-flow bricks.

use async_trait::async_trait;
use brickyard_expression::{render_explicit, render_implicit};
use brickyard_messenger::{DispatchOptions, DispatchRequest, RemoteRunOptions};
use brickyard_protocols::{
    ApiVersionOptions, BranchSegment, BrickError, ConfigValue, PipelineExpression, PipelineRunner,
    RegistryId, Root, RuntimeContext,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::scope::Scope;
use super::PipelineInterpreter;

/// Id of the brick that runs its `body` sub-pipeline once.
pub(crate) fn run_brick_id() -> RegistryId {
    RegistryId::builtin(crate::builtins::RUN)
}

/// Runs sub-pipelines on behalf of one stage.
///
/// Sub-pipelines see the stage's context extended with the brick's extra
/// variables, inherit its api version and run id, and get a child abort signal.
pub struct StageRunner {
    interpreter: PipelineInterpreter,
    ctx: RuntimeContext,
    scope: Scope,
}

impl StageRunner {
    pub(crate) fn new(interpreter: PipelineInterpreter, ctx: RuntimeContext, scope: Scope) -> Self {
        Self {
            interpreter,
            ctx,
            scope,
        }
    }
}

#[async_trait]
impl PipelineRunner for StageRunner {
    async fn run_pipeline(
        &self,
        pipeline: &PipelineExpression,
        branch: BranchSegment,
        extra: RuntimeContext,
        root: Option<Root>,
    ) -> Result<Value, BrickError> {
        let scope = self.scope.branch(branch, root);
        let ctx = self.ctx.extended(&extra);
        self.interpreter
            .run_scoped(pipeline.pipeline(), ctx, Value::Null, scope)
            .await
    }

    async fn run_in_all_frames(
        &self,
        pipeline: &PipelineExpression,
        branch: BranchSegment,
        extra: RuntimeContext,
    ) -> Result<Vec<Value>, BrickError> {
        self.scope.abort.check()?;
        let dispatcher = self.interpreter.dispatcher.as_ref().ok_or_else(|| {
            BrickError::Dispatch("running in all frames needs a dispatcher".to_string())
        })?;
        let frame = self.scope.frame.ok_or_else(|| {
            BrickError::Dispatch("running in all frames needs the frame of the run".to_string())
        })?;

        let scope = self.scope.branch(branch, None);
        let ctx = self.ctx.extended(&extra);
        let mut args = Map::new();
        args.insert("body".to_string(), pipeline.to_value());
        let request = DispatchRequest::new(run_brick_id(), args).with_options(RemoteRunOptions {
            ctxt: ctx.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            api_version: scope.api_version,
            run_id: Some(scope.run_id),
            mod_component_id: scope.mod_component_id,
            branches: scope.branches.clone(),
            frame: None,
        });
        let options = DispatchOptions {
            timeout: self.interpreter.settings.dispatch_timeout,
            abort: scope.abort.clone(),
        };

        debug!(
            run_id = %scope.run_id,
            tab_id = frame.tab_id,
            stages = pipeline.pipeline().len(),
            "Running sub-pipeline in all frames"
        );
        Ok(dispatcher
            .dispatch_all(frame.tab_id, &request, &options)
            .await?)
    }

    fn render_deferred(
        &self,
        config: &ConfigValue,
        extra: &RuntimeContext,
    ) -> Result<Value, BrickError> {
        let ctx = self.ctx.extended(extra);
        let api = self.scope.api();
        if api.explicit_arg {
            render_explicit(config, &ctx, &api)
        } else {
            render_implicit(config, &ctx, &api)
        }
    }

    fn api_options(&self) -> ApiVersionOptions {
        self.scope.api()
    }
}
