//! # Brickyard Expression
//!
//! Turns declarative brick configs into concrete arguments.
//!
//! - [`resolve_path`] - Variable paths such as `@input.user?.name`
//! - [`render_args`] - Explicit (v3) or implicit (v1/v2) argument rendering
//! - [`template`] - Mustache, nunjucks and handlebars engines
//! - [`validate_input`] - JSON Schema validation of resolved arguments
//! - [`is_truthy`] - Truthiness used by stage conditions

pub mod path;
pub mod render;
pub mod template;
pub mod truthy;
pub mod validate;

pub use path::{is_var_path, resolve_path};
pub use render::{
    evaluate_condition, render_args, render_explicit, render_implicit, resolve_expression,
};
pub use truthy::is_truthy;
pub use validate::{validate_input, validate_output};
