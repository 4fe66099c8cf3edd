//! Brick registry and brick sources.

mod brick;
mod source;

pub use brick::{BrickRegistry, RegistryEvent, TypedBricks};
pub use source::{BrickSource, StaticBrickSource, YamlBrickSource};
