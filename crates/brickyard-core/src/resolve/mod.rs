//! Mod document resolution.
//!
//! Inline definitions are given `@internal/<hash>` ids and registered, so
//! stage ids always resolve through the registry whether a brick is shared
//! or private to one mod.

mod definition;
mod resolver;

pub use definition::{
    InnerDefinition, InnerKind, ModComponentDefinition, ModDefinition, ModMetadata, ModOptions,
};
pub use resolver::{internal_id, resolve_mod, ResolvedModComponent, PIPELINE_KEYS};
