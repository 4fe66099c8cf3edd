//! Pipeline api versions and the rule sets they select.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline-level version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Implicit data flow and implicit (mustache) argument rendering.
    #[default]
    V1,
    /// Explicit data flow, input validation.
    V2,
    /// Explicit arguments: only tagged expressions are rendered.
    V3,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }

    pub fn options(&self) -> ApiVersionOptions {
        ApiVersionOptions::for_version(*self)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(ApiVersion::V1),
            "v2" => Ok(ApiVersion::V2),
            "v3" => Ok(ApiVersion::V3),
            other => Err(format!("unknown api version: {other}")),
        }
    }
}

/// Rule set derived from an [`ApiVersion`].
///
/// Computed once per run and shared, unchanged, by every nested sub-pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersionOptions {
    /// Only `outputKey` bindings flow between stages.
    pub explicit_data_flow: bool,

    /// Only tagged expressions are rendered; plain values pass through.
    pub explicit_arg: bool,

    /// Renderer output is not implicitly wrapped.
    pub explicit_render: bool,

    /// Validate resolved arguments against the brick's input schema.
    pub validate_input: bool,

    /// HTML-escape template output.
    pub autoescape: bool,
}

impl ApiVersionOptions {
    pub fn for_version(version: ApiVersion) -> Self {
        match version {
            ApiVersion::V1 => Self {
                explicit_data_flow: false,
                explicit_arg: false,
                explicit_render: false,
                validate_input: false,
                autoescape: true,
            },
            ApiVersion::V2 => Self {
                explicit_data_flow: true,
                explicit_arg: false,
                explicit_render: false,
                validate_input: true,
                autoescape: true,
            },
            ApiVersion::V3 => Self {
                explicit_data_flow: true,
                explicit_arg: true,
                explicit_render: true,
                validate_input: true,
                autoescape: false,
            },
        }
    }
}

impl Default for ApiVersionOptions {
    fn default() -> Self {
        Self::for_version(ApiVersion::default())
    }
}

impl From<ApiVersion> for ApiVersionOptions {
    fn from(version: ApiVersion) -> Self {
        Self::for_version(version)
    }
}
