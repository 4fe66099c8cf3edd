//! Running bricks requested by another context.

use async_trait::async_trait;
use brickyard_messenger::{Message, MessageHandler, MessengerError};
use brickyard_protocols::{BrickError, RuntimeContext};
use serde_json::Value;
use tracing::debug;

use crate::interpreter::{PipelineInterpreter, RunOptions};

/// Serves `RUN_BRICK` messages with a local interpreter.
///
/// Arguments arrive already rendered by the sender, so they are used as-is.
/// The sender traces the requested stage; only stages of sub-pipelines it
/// runs are traced here.
#[derive(Debug, Clone)]
pub struct RemoteBrickHandler {
    interpreter: PipelineInterpreter,
}

impl RemoteBrickHandler {
    pub fn new(interpreter: PipelineInterpreter) -> Self {
        Self { interpreter }
    }
}

#[async_trait]
impl MessageHandler for RemoteBrickHandler {
    async fn handle(&self, message: Message) -> Result<Value, MessengerError> {
        let request = message.into_request()?;
        let remote = request.options;
        debug!(brick_id = %request.brick_id, run_id = ?remote.run_id, "Handling remote brick request");

        let mut options = RunOptions::new(remote.api_version).with_branches(remote.branches);
        if let Some(run_id) = remote.run_id {
            options = options.with_run_id(run_id);
        }
        if let Some(id) = remote.mod_component_id {
            options = options.with_mod_component(id);
        }
        if let Some(frame) = remote.frame {
            options = options.with_frame(frame);
        }

        self.interpreter
            .run_brick(
                &request.brick_id,
                request.args,
                RuntimeContext::from_iter(remote.ctxt),
                options,
            )
            .await
            .map_err(|e| to_remote(&e))
    }
}

fn to_remote(error: &BrickError) -> MessengerError {
    MessengerError::remote(error.root_cause().name(), error.root_cause().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::PageStateStore;
    use brickyard_core::BrickRegistry;
    use crate::builtins::{IDENTITY, RUN};
    use crate::trace::InMemoryTraceSink;
    use brickyard_messenger::{
        DispatchOptions, DispatchRequest, Dispatcher, FrameTarget, LocalMessenger, RemoteRunOptions,
    };
    use brickyard_protocols::{
        ApiVersion, BranchSegment, BrickConfig, ConfigValue, FrameLocation, RegistryId, WindowTarget,
    };
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    fn interpreter() -> PipelineInterpreter {
        let registry = BrickRegistry::new();
        register_builtins(&registry, PageStateStore::new());
        PipelineInterpreter::new(registry)
    }

    fn handler() -> RemoteBrickHandler {
        RemoteBrickHandler::new(interpreter())
    }

    fn request_with(brick: &str, args: Value, options: RemoteRunOptions) -> Message {
        let Value::Object(args) = args else {
            panic!("args must be an object");
        };
        let request = DispatchRequest::new(RegistryId::builtin(brick), args).with_options(options);
        Message::run_brick(&request).unwrap()
    }

    fn request(brick: &str, args: Value) -> Message {
        request_with(
            brick,
            args,
            RemoteRunOptions {
                api_version: ApiVersion::V3,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_runs_brick_with_literal_args() {
        let output = handler()
            .handle(request("echo", json!({"message": "{{ not rendered }}"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"message": "{{ not rendered }}"}));
    }

    #[tokio::test]
    async fn test_business_error_keeps_its_name() {
        let err = handler()
            .handle(request("error", json!({"message": "nope"})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MessengerError::Remote {
                name: "BusinessError".to_string(),
                message: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_requested_stage_is_not_traced_but_its_body_is() {
        let trace = Arc::new(InMemoryTraceSink::new());
        let handler = RemoteBrickHandler::new(interpreter().with_trace_sink(trace.clone()));
        let run_id = Uuid::new_v4();
        let options = RemoteRunOptions {
            api_version: ApiVersion::V3,
            run_id: Some(run_id),
            branches: vec![BranchSegment::new("body", 0)],
            ..Default::default()
        };

        handler
            .handle(request_with(IDENTITY, json!({"v": 1}), options.clone()))
            .await
            .unwrap();
        assert!(trace.is_empty());

        let body = ConfigValue::pipeline(vec![BrickConfig::new(RegistryId::builtin(IDENTITY))]);
        handler
            .handle(request_with(RUN, json!({"body": Value::from(body)}), options))
            .await
            .unwrap();
        let records = trace.records_for_run(run_id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brick_id, RegistryId::builtin(IDENTITY));
        assert_eq!(
            records[0].branches,
            vec![BranchSegment::new("body", 0), BranchSegment::new("body", 0)]
        );
    }

    #[tokio::test]
    async fn test_top_frame_stage_inside_dispatched_body() {
        let messenger = LocalMessenger::new();
        let dispatcher = Dispatcher::new(Arc::new(messenger.clone()), Arc::new(messenger.clone()));
        let top = FrameLocation::top(4);
        messenger.register(
            top,
            Arc::new(RemoteBrickHandler::new(interpreter().with_dispatcher(dispatcher))),
        );

        let body = ConfigValue::pipeline(vec![BrickConfig::new(RegistryId::builtin(IDENTITY))
            .with_arg("where", ConfigValue::literal("top"))
            .with_window(WindowTarget::Top)]);
        let request = DispatchRequest::new(
            RegistryId::builtin(RUN),
            json!({"body": Value::from(body)}).as_object().cloned().unwrap(),
        )
        .with_options(RemoteRunOptions {
            api_version: ApiVersion::V3,
            ..Default::default()
        });
        let caller = Dispatcher::new(Arc::new(messenger.clone()), Arc::new(messenger));
        let output = caller
            .dispatch(FrameTarget::top_frame(4), &request, &DispatchOptions::default())
            .await
            .unwrap();
        assert_eq!(output, json!({"where": "top"}));
    }

    #[tokio::test]
    async fn test_rejects_other_messages() {
        let err = handler()
            .handle(Message::new("PING", Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, MessengerError::UnknownMessageType(_)));
    }
}
