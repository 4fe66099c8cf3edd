//! # Brickyard Runtime
//!
//! Executes brick pipelines.
//!
//! - [`PipelineInterpreter`] - sequential, tree-shaped pipeline interpreter
//! - [`StageRunner`] - sub-pipeline handle given to control-flow bricks
//! - [`TraceSink`] - append-only destination for per-stage trace records
//! - [`builtins`] - bricks shipped with the runtime
//! - [`RemoteBrickHandler`] - runs bricks requested from another context

pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod remote;
pub mod trace;

pub use builtins::{register_builtins, PageStateStore};
pub use error::TraceError;
pub use interpreter::{InitialValues, InterpreterSettings, PipelineInterpreter, RunOptions, StageRunner};
pub use remote::RemoteBrickHandler;
pub use trace::{InMemoryTraceSink, NoopTraceSink, SqliteTraceSink, TraceSink};
