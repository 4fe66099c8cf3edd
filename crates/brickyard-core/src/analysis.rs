//! Static analysis of pipelines.

use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeSet, HashSet};

use brickyard_protocols::{
    Brick, BrickPipeline, BrickType, PipelineFlavor, PlatformCapability, RegistryId,
};

use crate::registry::{BrickRegistry, TypedBricks};

/// Bricks allowed in every pipeline flavor, because control flow must always
/// be able to signal an error.
pub const FLAVOR_EXEMPT_BRICKS: &[&str] = &["@brickyard/error"];

/// Aggregated declarations of every brick reachable from a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineAnalysis {
    pub pure: bool,
    pub root_aware: bool,
    pub page_state_aware: bool,
    pub capabilities: BTreeSet<PlatformCapability>,
}

impl Default for PipelineAnalysis {
    fn default() -> Self {
        Self {
            pure: true,
            root_aware: false,
            page_state_aware: false,
            capabilities: BTreeSet::new(),
        }
    }
}

/// Recursive analysis over stages, sub-pipelines and composite bricks.
///
/// Unknown bricks are treated as impure and root-aware.
pub struct PipelineAnalyzer {
    registry: BrickRegistry,
}

impl PipelineAnalyzer {
    pub fn new(registry: BrickRegistry) -> Self {
        Self { registry }
    }

    pub async fn analyze(&self, pipeline: &BrickPipeline) -> PipelineAnalysis {
        let mut analysis = PipelineAnalysis::default();
        let mut visited = HashSet::new();
        self.visit_pipeline(pipeline, &mut visited, &mut analysis).await;
        analysis
    }

    /// Analysis of a single brick, descending into composites.
    pub async fn analyze_brick(&self, brick: &Brick) -> PipelineAnalysis {
        let mut analysis = PipelineAnalysis::default();
        let mut visited = HashSet::new();
        self.visit_brick(brick, &mut visited, &mut analysis).await;
        analysis
    }

    pub async fn is_pure(&self, pipeline: &BrickPipeline) -> bool {
        self.analyze(pipeline).await.pure
    }

    pub async fn is_root_aware(&self, pipeline: &BrickPipeline) -> bool {
        self.analyze(pipeline).await.root_aware
    }

    pub async fn is_page_state_aware(&self, pipeline: &BrickPipeline) -> bool {
        self.analyze(pipeline).await.page_state_aware
    }

    pub async fn required_capabilities(&self, pipeline: &BrickPipeline) -> Vec<PlatformCapability> {
        self.analyze(pipeline).await.capabilities.into_iter().collect()
    }

    fn visit_pipeline<'a>(
        &'a self,
        pipeline: &'a BrickPipeline,
        visited: &'a mut HashSet<RegistryId>,
        analysis: &'a mut PipelineAnalysis,
    ) -> BoxFuture<'a, ()> {
        async move {
            for stage in pipeline {
                match self.registry.lookup(&stage.id).await {
                    Ok(brick) => self.visit_brick(&brick, visited, analysis).await,
                    Err(_) => {
                        analysis.pure = false;
                        analysis.root_aware = true;
                    }
                }
                for value in stage.config.values() {
                    for sub in value.pipelines() {
                        self.visit_pipeline(sub.pipeline(), visited, analysis).await;
                    }
                }
            }
        }
        .boxed()
    }

    fn visit_brick<'a>(
        &'a self,
        brick: &'a Brick,
        visited: &'a mut HashSet<RegistryId>,
        analysis: &'a mut PipelineAnalysis,
    ) -> BoxFuture<'a, ()> {
        async move {
            if let Some(composite) = brick.as_composite() {
                if visited.insert(composite.id().clone()) {
                    self.visit_pipeline(composite.pipeline(), visited, analysis).await;
                }
                return;
            }
            analysis.pure &= brick.is_pure().await;
            analysis.root_aware |= brick.is_root_aware().await;
            analysis.page_state_aware |= brick.is_page_state_aware().await;
            analysis
                .capabilities
                .extend(brick.required_capabilities().await);
        }
        .boxed()
    }
}

/// A stage whose brick type the pipeline's flavor does not allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorViolation {
    pub stage_index: usize,
    pub brick_id: RegistryId,
    pub brick_type: BrickType,
}

/// Editor-time check of the top-level stages against a flavor.
///
/// Bricks missing from `typed` are not reported here.
pub fn check_pipeline_flavor(
    pipeline: &BrickPipeline,
    flavor: PipelineFlavor,
    typed: &TypedBricks,
) -> Vec<FlavorViolation> {
    pipeline
        .iter()
        .enumerate()
        .filter(|(_, stage)| !FLAVOR_EXEMPT_BRICKS.contains(&stage.id.as_str()))
        .filter_map(|(stage_index, stage)| {
            let pair = typed.get(&stage.id)?;
            (!flavor.allows(pair.brick_type)).then(|| FlavorViolation {
                stage_index,
                brick_id: stage.id.clone(),
                brick_type: pair.brick_type,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
