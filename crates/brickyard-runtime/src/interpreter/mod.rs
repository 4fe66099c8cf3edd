//! Pipeline interpreter.
//!
//! Stages run strictly in order. Each stage goes through
//! `condition -> lookup -> render -> pre-flight -> validate -> execute -> trace`,
//! then its output flows to later stages according to the api version.

mod runner;
mod scope;
mod stage;

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;

pub use runner::StageRunner;

use std::sync::Arc;
use std::time::Duration;

use brickyard_core::BrickRegistry;
use brickyard_messenger::Dispatcher;
use brickyard_protocols::{
    AbortSignal, ApiVersion, BranchSegment, BrickConfig, BrickError, BrickType, FrameLocation,
    Platform, RegistryId, Root, RuntimeContext, StaticPlatform,
};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::trace::{NoopTraceSink, TraceSink};
use scope::Scope;

/// Default limit on nested pipelines (sub-pipelines and composite bricks).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Interpreter-wide settings.
#[derive(Debug, Clone)]
pub struct InterpreterSettings {
    pub max_depth: usize,

    /// Check brick outputs against declared output schemas and log violations.
    pub validate_output: bool,

    /// Per-target timeout for stages run in another frame.
    pub dispatch_timeout: Option<Duration>,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            validate_output: false,
            dispatch_timeout: None,
        }
    }
}

/// Values a run starts from.
#[derive(Debug, Clone, Default)]
pub struct InitialValues {
    /// Bound to `@input`.
    pub input: Value,

    /// Bound to `@options`.
    pub options: Value,

    /// Integration configs, each bound to `@<key>`.
    pub integrations: Map<String, Value>,

    /// Root element of the run; `None` is the document.
    pub root: Option<Root>,
}

impl InitialValues {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            options: Value::Object(Map::new()),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn with_integration(mut self, key: impl Into<String>, config: Value) -> Self {
        self.integrations.insert(key.into(), config);
        self
    }

    pub fn with_root(mut self, root: Root) -> Self {
        self.root = Some(root);
        self
    }

    /// The context the first stage sees.
    pub fn context(&self) -> RuntimeContext {
        self.integrations.iter().fold(
            RuntimeContext::from_input(self.input.clone(), self.options.clone()),
            |ctx, (key, config)| {
                let key = key.strip_prefix('@').unwrap_or(key);
                ctx.with_var(format!("@{key}"), config.clone())
            },
        )
    }
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub api_version: ApiVersion,
    pub run_id: Uuid,
    pub mod_component_id: Option<Uuid>,

    /// Branch path of the caller, for runs nested in another run.
    pub branches: Vec<BranchSegment>,

    pub abort: AbortSignal,

    /// Frame the run executes in.
    pub frame: Option<FrameLocation>,

    /// Frame that opened the current tab.
    pub opener: Option<FrameLocation>,

    /// Overrides [`InterpreterSettings::max_depth`].
    pub max_depth: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(ApiVersion::default())
    }
}

impl RunOptions {
    pub fn new(api_version: ApiVersion) -> Self {
        Self {
            api_version,
            run_id: Uuid::new_v4(),
            mod_component_id: None,
            branches: Vec::new(),
            abort: AbortSignal::new(),
            frame: None,
            opener: None,
            max_depth: None,
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_mod_component(mut self, id: Uuid) -> Self {
        self.mod_component_id = Some(id);
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_frame(mut self, frame: FrameLocation) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_opener(mut self, opener: FrameLocation) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_branches(mut self, branches: Vec<BranchSegment>) -> Self {
        self.branches = branches;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Runs brick pipelines against a registry.
///
/// Cheap to clone; clones share the registry, platform, trace sink and
/// dispatcher.
#[derive(Clone)]
pub struct PipelineInterpreter {
    pub(crate) registry: BrickRegistry,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) trace: Arc<dyn TraceSink>,
    pub(crate) dispatcher: Option<Dispatcher>,
    pub(crate) settings: InterpreterSettings,
}

impl PipelineInterpreter {
    /// Create an interpreter on a platform with every capability.
    pub fn new(registry: BrickRegistry) -> Self {
        Self {
            registry,
            platform: Arc::new(StaticPlatform::full("local")),
            trace: Arc::new(NoopTraceSink),
            dispatcher: None,
            settings: InterpreterSettings::default(),
        }
    }

    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_trace_sink(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_settings(mut self, settings: InterpreterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &BrickRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Run a pipeline to completion.
    ///
    /// Rejects with the first stage error, wrapped with the failing stage's
    /// location, or with [`BrickError::Cancelled`] once `options.abort` fires.
    pub async fn run(
        &self,
        pipeline: &[BrickConfig],
        initial: InitialValues,
        options: RunOptions,
    ) -> Result<Value, BrickError> {
        let scope = self.scope(&options, initial.root.clone());
        info!(
            run_id = %scope.run_id,
            api_version = %scope.api_version,
            stages = pipeline.len(),
            "Starting pipeline run"
        );

        let ctx = initial.context();
        let result = self.run_scoped(pipeline, ctx, initial.input, scope).await;
        log_outcome(options.run_id, &result);
        result
    }

    /// Run one brick with already-resolved arguments.
    ///
    /// The stage is validated like any other, but its arguments are not
    /// rendered again and it leaves no trace record of its own: the context
    /// that dispatched it records the stage.
    pub async fn run_brick(
        &self,
        brick_id: &RegistryId,
        args: Map<String, Value>,
        ctxt: RuntimeContext,
        options: RunOptions,
    ) -> Result<Value, BrickError> {
        let scope = self.scope(&options, None);
        debug!(run_id = %scope.run_id, %brick_id, "Running single brick");
        let stage = BrickConfig::new(brick_id.clone());
        let result = self
            .run_dispatched(&stage, &ctxt, &scope, Value::Object(args))
            .await;
        log_outcome(options.run_id, &result);
        result
    }

    fn scope(&self, options: &RunOptions, root: Option<Root>) -> Scope {
        Scope {
            api_version: options.api_version,
            run_id: options.run_id,
            mod_component_id: options.mod_component_id,
            branches: options.branches.clone(),
            abort: options.abort.clone(),
            root,
            frame: options.frame,
            opener: options.opener,
            depth: 0,
            max_depth: options.max_depth.unwrap_or(self.settings.max_depth),
        }
    }

    /// Run a pipeline in a scope (boxed for recursion).
    ///
    /// `implicit` is the initial implicit input under v1 data flow.
    pub(crate) fn run_scoped<'a>(
        &'a self,
        pipeline: &'a [BrickConfig],
        ctx: RuntimeContext,
        implicit: Value,
        scope: Scope,
    ) -> BoxFuture<'a, Result<Value, BrickError>> {
        Box::pin(async move {
            scope.abort.check()?;
            if scope.depth > scope.max_depth {
                return Err(BrickError::MaxDepthExceeded(scope.max_depth));
            }

            let api = scope.api();
            let mut ctx = ctx;
            let mut implicit = implicit;
            let mut output = Value::Null;

            for (index, stage) in pipeline.iter().enumerate() {
                scope.abort.check()?;

                let stage_ctx = if api.explicit_data_flow {
                    ctx.clone()
                } else {
                    ctx.merged_with_object(&implicit)
                };

                let Some((value, brick_type)) =
                    self.run_stage(stage, index, &stage_ctx, &scope).await?
                else {
                    continue;
                };

                if let Some(key) = &stage.output_key {
                    ctx = ctx.with_var(key.variable(), value.clone());
                } else if !api.explicit_data_flow && brick_type != Some(BrickType::Effect) {
                    implicit = value.clone();
                }
                output = value;
            }

            Ok(output)
        })
    }
}

fn log_outcome(run_id: Uuid, result: &Result<Value, BrickError>) {
    match result {
        Ok(_) => info!(%run_id, "Pipeline run completed"),
        Err(e) if e.is_cancellation() => info!(%run_id, "Pipeline run cancelled"),
        Err(e) => error!(%run_id, error = %e, "Pipeline run failed"),
    }
}

impl std::fmt::Debug for PipelineInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineInterpreter")
            .field("bricks", &self.registry.len())
            .field("platform", &self.platform.name())
            .field("dispatcher", &self.dispatcher)
            .field("settings", &self.settings)
            .finish()
    }
}
