//! # Brickyard Protocols
//!
//! Core data model and trait definitions for the Brickyard pipeline runtime.
//! Contains only interface definitions - no interpreter, registry or
//! template engine.
//!
//! ## Core Types
//!
//! - [`BrickConfig`] / [`BrickPipeline`] - One pipeline stage / an ordered list of stages
//! - [`ConfigValue`] / [`Expression`] - Declarative arguments with deferred computation
//! - [`ApiVersion`] / [`ApiVersionOptions`] - Versioned pipeline semantics
//! - [`RuntimeContext`] - Copy-on-write variable environment
//!
//! ## Core Traits
//!
//! - [`BrickCore`] - Declarations shared by every brick
//! - [`Reader`], [`Transformer`], [`Effect`], [`Renderer`] - The four execution capabilities
//! - [`PipelineRunner`] - Handle control-flow bricks use to run sub-pipelines
//! - [`Platform`] - Host environment capabilities

pub mod brick;
pub mod error;
pub mod types;

pub use brick::{
    empty_object_schema, AbortSignal, Brick, BrickArgs, BrickCore, BrickDefinition, BrickLogger,
    BrickMetadata, BrickOptions, CompositeBrick, CompositeBrickSpec, Effect, Platform, PipelineRunner, Reader, Renderer,
    RendererPayload, StaticPlatform, Transformer,
};
pub use error::{
    BrickError, ConfigValueError, ContextError, InvalidRegistryId, TypeInferenceError,
};
pub use types::*;
