//! # Brickyard Core
//!
//! Registry and static analysis for the Brickyard pipeline runtime.
//!
//! ## Components
//!
//! - [`BrickRegistry`] - Explicitly constructed brick registry with a shared typed cache
//! - [`infer_type`] - Type inference for composite bricks
//! - [`PipelineAnalyzer`] - Recursive purity, root-awareness and capability analysis
//! - [`resolve_mod`] - Turns a mod document into runnable mod components

pub mod analysis;
pub mod error;
pub mod inference;
pub mod registry;
pub mod resolve;

pub use analysis::{
    check_pipeline_flavor, FlavorViolation, PipelineAnalysis, PipelineAnalyzer, FLAVOR_EXEMPT_BRICKS,
};
pub use error::{ModError, SourceError};
pub use inference::{infer_type, TypedBrickPair};
pub use registry::{
    BrickRegistry, BrickSource, RegistryEvent, StaticBrickSource, TypedBricks, YamlBrickSource,
};
pub use resolve::{resolve_mod, ModDefinition, ResolvedModComponent};
