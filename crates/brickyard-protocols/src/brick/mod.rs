//! Brick contract definitions.
//!
//! Every brick exposes exactly one execution capability. The interpreter
//! dispatches on the [`Brick`] variant instead of probing for methods.

mod abort;
mod args;
mod composite;
mod definition;
mod options;
mod platform;
mod traits;

pub use abort::*;
pub use args::*;
pub use composite::*;
pub use definition::*;
pub use options::*;
pub use platform::*;
pub use traits::*;
