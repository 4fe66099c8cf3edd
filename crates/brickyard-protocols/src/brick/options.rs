//! Options passed to every brick invocation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::{AbortSignal, Platform};
use crate::error::BrickError;
use crate::types::{
    ApiVersionOptions, BranchSegment, ConfigValue, PipelineExpression, RegistryId, Root,
    RuntimeContext,
};

/// Handle control-flow bricks use to run their sub-pipelines.
///
/// Sub-pipelines always go back through the interpreter, so they inherit the
/// caller's api version, abort signal, run id and trace branch path.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Run a sub-pipeline once.
    ///
    /// `extra` is layered over the caller's context. `root` rebinds the root
    /// element for the sub-pipeline only; `None` keeps the caller's root.
    async fn run_pipeline(
        &self,
        pipeline: &PipelineExpression,
        branch: BranchSegment,
        extra: RuntimeContext,
        root: Option<Root>,
    ) -> Result<Value, BrickError>;

    /// Run a sub-pipeline in every frame of the current tab.
    ///
    /// Frames that fail are left out of the result.
    async fn run_in_all_frames(
        &self,
        pipeline: &PipelineExpression,
        branch: BranchSegment,
        extra: RuntimeContext,
    ) -> Result<Vec<Value>, BrickError>;

    /// Render a deferred config against the caller's context plus `extra`.
    fn render_deferred(
        &self,
        config: &ConfigValue,
        extra: &RuntimeContext,
    ) -> Result<Value, BrickError>;

    /// Semantics of the pipeline the brick is running in.
    fn api_options(&self) -> ApiVersionOptions;
}

/// Structured logger scoped to one stage.
#[derive(Debug, Clone)]
pub struct BrickLogger {
    pub run_id: Uuid,
    pub mod_component_id: Option<Uuid>,
    pub brick_id: Option<RegistryId>,
    pub instance_id: Option<Uuid>,
}

impl BrickLogger {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            mod_component_id: None,
            brick_id: None,
            instance_id: None,
        }
    }

    pub fn with_mod_component(mut self, id: Option<Uuid>) -> Self {
        self.mod_component_id = id;
        self
    }

    /// A logger tagged with the given stage.
    pub fn for_brick(&self, brick_id: &RegistryId, instance_id: Option<Uuid>) -> Self {
        Self {
            brick_id: Some(brick_id.clone()),
            instance_id,
            ..self.clone()
        }
    }

    fn brick(&self) -> &str {
        self.brick_id.as_ref().map(RegistryId::as_str).unwrap_or("")
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(
            run_id = %self.run_id,
            mod_component_id = ?self.mod_component_id,
            brick_id = self.brick(),
            instance_id = ?self.instance_id,
            "{message}"
        );
    }

    pub fn info(&self, message: &str) {
        tracing::info!(
            run_id = %self.run_id,
            mod_component_id = ?self.mod_component_id,
            brick_id = self.brick(),
            instance_id = ?self.instance_id,
            "{message}"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            run_id = %self.run_id,
            mod_component_id = ?self.mod_component_id,
            brick_id = self.brick(),
            instance_id = ?self.instance_id,
            "{message}"
        );
    }

    pub fn error(&self, message: &str) {
        tracing::error!(
            run_id = %self.run_id,
            mod_component_id = ?self.mod_component_id,
            brick_id = self.brick(),
            instance_id = ?self.instance_id,
            "{message}"
        );
    }
}

/// Everything a brick receives besides its arguments.
#[derive(Clone)]
pub struct BrickOptions {
    /// Variables visible to the stage.
    pub ctxt: RuntimeContext,

    /// Root element, only set for root-aware bricks.
    pub root: Option<Root>,

    pub logger: BrickLogger,

    /// Abort signal for this stage.
    pub abort: AbortSignal,

    pub platform: Arc<dyn Platform>,

    /// Runs sub-pipelines on behalf of control-flow bricks.
    pub runner: Arc<dyn PipelineRunner>,
}

impl BrickOptions {
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl std::fmt::Debug for BrickOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrickOptions")
            .field("ctxt", &self.ctxt)
            .field("root", &self.root)
            .field("logger", &self.logger)
            .field("aborted", &self.abort.is_aborted())
            .field("platform", &self.platform.name())
            .finish()
    }
}
