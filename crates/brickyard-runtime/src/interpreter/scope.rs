//! Per-pipeline execution state.

use brickyard_protocols::{
    AbortSignal, ApiVersion, ApiVersionOptions, BranchSegment, FrameLocation, Root,
};
use uuid::Uuid;

/// State inherited by every stage of one pipeline and by its sub-pipelines.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub api_version: ApiVersion,
    pub run_id: Uuid,
    pub mod_component_id: Option<Uuid>,
    pub branches: Vec<BranchSegment>,
    pub abort: AbortSignal,
    /// `None` means the frame's document.
    pub root: Option<Root>,
    pub frame: Option<FrameLocation>,
    pub opener: Option<FrameLocation>,
    pub depth: usize,
    pub max_depth: usize,
}

impl Scope {
    pub fn api(&self) -> ApiVersionOptions {
        self.api_version.options()
    }

    /// Scope of a sub-pipeline run by a control-flow brick.
    pub fn branch(&self, branch: BranchSegment, root: Option<Root>) -> Self {
        let mut branches = self.branches.clone();
        branches.push(branch);
        Self {
            branches,
            abort: self.abort.child(),
            root: root.or_else(|| self.root.clone()),
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Scope of a composite brick's inner pipeline.
    pub fn composite(&self, api_version: ApiVersion) -> Self {
        Self {
            api_version,
            depth: self.depth + 1,
            ..self.clone()
        }
    }
}
