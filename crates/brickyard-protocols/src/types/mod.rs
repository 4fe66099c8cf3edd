//! Common types used across the Brickyard runtime.

mod api_version;
mod common;
mod config_value;
mod context;
mod pipeline;
mod registry_id;
mod trace;

pub use api_version::*;
pub use common::*;
pub use config_value::*;
pub use context::*;
pub use pipeline::*;
pub use registry_id::*;
pub use trace::*;
