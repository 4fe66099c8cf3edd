//! Error types for the Brickyard protocol layer.

mod brick;
mod config;
mod context;
mod inference;

pub use brick::*;
pub use config::*;
pub use context::*;
pub use inference::*;
