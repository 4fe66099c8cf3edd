//! Bricks shipped with the runtime.
//!
//! All built-in ids live in the `@brickyard` scope.

mod basic;
mod control;
mod page_state;
mod toggle;

pub use basic::{CancelBrick, EchoBrick, ErrorBrick, IdentityBrick};
pub use control::{
    ForEachBrick, IfElseBrick, MapBrick, RunBrick, RunInAllFramesBrick, TryExceptBrick,
};
pub use page_state::{GetPageStateBrick, MergeStrategy, PageStateStore, SetPageStateBrick};
pub use toggle::{toggle_exclusive_option, ToggleClassBrick};

use brickyard_core::BrickRegistry;
use brickyard_protocols::{empty_object_schema, Brick};
use schemars::JsonSchema;
use serde_json::Value;

pub const IDENTITY: &str = "identity";
pub const ECHO: &str = "echo";
pub const IF_ELSE: &str = "if-else";
pub const FOR_EACH: &str = "for-each";
pub const MAP: &str = "map";
pub const TRY_EXCEPT: &str = "try-except";
pub const RUN: &str = "run";
pub const ERROR: &str = "error";
pub const CANCEL: &str = "cancel";
pub const TOGGLE_CLASS: &str = "toggle-class";
pub const GET_PAGE_STATE: &str = "get-page-state";
pub const SET_PAGE_STATE: &str = "set-page-state";
pub const RUN_IN_ALL_FRAMES: &str = "run-in-all-frames";

/// Every built-in brick, sharing one page state store.
pub fn builtin_bricks(state: PageStateStore) -> Vec<Brick> {
    vec![
        Brick::transformer(IdentityBrick::new()),
        Brick::transformer(EchoBrick::new()),
        Brick::transformer(IfElseBrick::new()),
        Brick::transformer(ForEachBrick::new()),
        Brick::transformer(MapBrick::new()),
        Brick::transformer(TryExceptBrick::new()),
        Brick::transformer(RunBrick::new()),
        Brick::effect(ErrorBrick::new()),
        Brick::effect(CancelBrick::new()),
        Brick::transformer(ToggleClassBrick::new()),
        Brick::transformer(GetPageStateBrick::new(state.clone())),
        Brick::transformer(SetPageStateBrick::new(state)),
        Brick::effect(RunInAllFramesBrick::new()),
    ]
}

/// Register every built-in brick.
pub fn register_builtins(registry: &BrickRegistry, state: PageStateStore) {
    registry.register(builtin_bricks(state));
}

/// Input schema derived from an argument struct.
pub(crate) fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| empty_object_schema())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Options for calling built-in bricks directly.

    use async_trait::async_trait;
    use brickyard_protocols::{
        AbortSignal, ApiVersion, ApiVersionOptions, BranchSegment, BrickError, BrickLogger,
        BrickOptions, ConfigValue, PipelineExpression, PipelineRunner, Root, RuntimeContext,
        StaticPlatform,
    };
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    /// Records sub-pipeline calls and answers from a script.
    #[derive(Default)]
    pub struct ScriptedRunner {
        pub calls: Mutex<Vec<(BranchSegment, RuntimeContext, usize)>>,
        /// Called with the branch; returns the sub-pipeline output.
        pub respond: Option<Box<dyn Fn(&BranchSegment, &RuntimeContext) -> Result<Value, BrickError> + Send + Sync>>,
    }

    impl ScriptedRunner {
        pub fn responding(
            respond: impl Fn(&BranchSegment, &RuntimeContext) -> Result<Value, BrickError>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Some(Box::new(respond)),
            }
        }

        pub fn branches(&self) -> Vec<BranchSegment> {
            self.calls.lock().iter().map(|(b, _, _)| b.clone()).collect()
        }
    }

    #[async_trait]
    impl PipelineRunner for ScriptedRunner {
        async fn run_pipeline(
            &self,
            pipeline: &PipelineExpression,
            branch: BranchSegment,
            extra: RuntimeContext,
            _root: Option<Root>,
        ) -> Result<Value, BrickError> {
            let result = match &self.respond {
                Some(respond) => respond(&branch, &extra),
                None => Ok(Value::Null),
            };
            self.calls
                .lock()
                .push((branch, extra, pipeline.pipeline().len()));
            result
        }

        async fn run_in_all_frames(
            &self,
            pipeline: &PipelineExpression,
            branch: BranchSegment,
            extra: RuntimeContext,
        ) -> Result<Vec<Value>, BrickError> {
            self.calls
                .lock()
                .push((branch, extra, pipeline.pipeline().len()));
            Ok(Vec::new())
        }

        fn render_deferred(
            &self,
            config: &ConfigValue,
            extra: &RuntimeContext,
        ) -> Result<Value, BrickError> {
            brickyard_expression::render_explicit(config, extra, &self.api_options())
        }

        fn api_options(&self) -> ApiVersionOptions {
            ApiVersion::V3.options()
        }
    }

    pub fn options_with(runner: Arc<ScriptedRunner>) -> BrickOptions {
        BrickOptions {
            ctxt: RuntimeContext::new(),
            root: None,
            logger: BrickLogger::new(Uuid::new_v4()),
            abort: AbortSignal::new(),
            platform: Arc::new(StaticPlatform::full("test")),
            runner,
        }
    }

    pub fn options() -> BrickOptions {
        options_with(Arc::new(ScriptedRunner::default()))
    }
}
