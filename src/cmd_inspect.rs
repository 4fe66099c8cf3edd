//! `brickyard bricks` and `brickyard validate`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde_json::json;

use brickyard_config::{Config, ConfigValidator};
use brickyard_core::{
    resolve_mod, BrickRegistry, PipelineAnalysis, PipelineAnalyzer, ResolvedModComponent,
};
use brickyard_protocols::{BrickPipeline, Platform, PlatformCapability, RegistryId};

use crate::cli::OutputFormat;
use crate::register::{build_platform, build_registry, load_mod};

pub(crate) async fn cmd_bricks(config: &Config, brick_dirs: &[PathBuf], format: OutputFormat) -> Result<()> {
    let registry = build_registry(&config.registry, brick_dirs);
    let typed = registry.all_typed().await;

    match format {
        OutputFormat::Json => {
            let bricks: Vec<_> = typed
                .values()
                .map(|pair| {
                    json!({
                        "id": pair.brick.id(),
                        "type": pair.brick_type.as_str(),
                        "name": pair.brick.definition().name,
                        "description": pair.brick.definition().description,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&bricks)?);
        }
        OutputFormat::Table => {
            println!("{:<40} {:<10} NAME", "ID", "TYPE");
            for (id, pair) in typed.iter() {
                println!(
                    "{:<40} {:<10} {}",
                    id.as_str(),
                    pair.brick_type.as_str(),
                    pair.brick.definition().name
                );
            }
            println!("\n{} bricks", typed.len());
        }
    }
    Ok(())
}

/// What `validate` found for one component.
#[derive(Debug)]
pub(crate) struct ComponentReport {
    pub label: String,
    pub analysis: PipelineAnalysis,
    pub unknown_bricks: Vec<RegistryId>,
    pub missing_capabilities: Vec<PlatformCapability>,
}

impl ComponentReport {
    pub(crate) fn is_runnable(&self) -> bool {
        self.unknown_bricks.is_empty() && self.missing_capabilities.is_empty()
    }
}

pub(crate) async fn inspect_component(
    registry: &BrickRegistry,
    platform: &dyn Platform,
    component: &ResolvedModComponent,
) -> ComponentReport {
    let analysis = PipelineAnalyzer::new(registry.clone())
        .analyze(&component.pipeline)
        .await;
    let required: Vec<PlatformCapability> = analysis.capabilities.iter().copied().collect();

    let mut unknown_bricks = Vec::new();
    collect_unknown(&component.pipeline, registry, &mut unknown_bricks).await;

    ComponentReport {
        label: component.label.clone(),
        missing_capabilities: platform.missing_capabilities(&required),
        unknown_bricks,
        analysis,
    }
}

async fn collect_unknown(pipeline: &BrickPipeline, registry: &BrickRegistry, unknown: &mut Vec<RegistryId>) {
    for stage in pipeline {
        if registry.lookup(&stage.id).await.is_err() && !unknown.contains(&stage.id) {
            unknown.push(stage.id.clone());
        }
        for value in stage.config.values() {
            for sub in value.pipelines() {
                Box::pin(collect_unknown(sub.pipeline(), registry, unknown)).await;
            }
        }
    }
}

pub(crate) async fn cmd_validate(config: &Config, mod_path: &Path, brick_dirs: &[PathBuf]) -> Result<()> {
    for warning in ConfigValidator::validate(config).warnings {
        println!("config warning: {}: {}", warning.path, warning.message);
    }

    let registry = build_registry(&config.registry, brick_dirs);
    let definition = load_mod(mod_path, config.runtime.default_api_version)?;
    let components = resolve_mod(&definition, &registry)?;
    let platform = build_platform(&config.platform);

    println!(
        "{} ({}), api {}, {} component(s)",
        definition.metadata.name,
        definition.metadata.id,
        definition.api_version,
        components.len()
    );

    let mut runnable = true;
    for (index, component) in components.iter().enumerate() {
        let report = inspect_component(&registry, &platform, component).await;
        print_report(index, component, &report);
        runnable &= report.is_runnable();
    }

    if !runnable {
        bail!("{} has problems", mod_path.display());
    }
    Ok(())
}

fn print_report(index: usize, component: &ResolvedModComponent, report: &ComponentReport) {
    let analysis = &report.analysis;
    println!(
        "\n[{index}] {} ({} stages, starter {})",
        report.label,
        component.pipeline.len(),
        component.starter_brick
    );
    println!(
        "  pure: {}, root aware: {}, page state aware: {}",
        analysis.pure, analysis.root_aware, analysis.page_state_aware
    );
    if !analysis.capabilities.is_empty() {
        let capabilities: Vec<&str> = analysis.capabilities.iter().map(|c| c.as_str()).collect();
        println!("  requires: {}", capabilities.join(", "));
    }
    for id in &report.unknown_bricks {
        println!("  unknown brick: {id}");
    }
    for capability in &report.missing_capabilities {
        println!("  platform lacks: {}", capability.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::parse_mod;
    use brickyard_protocols::{ApiVersion, StaticPlatform};

    const MOD_YAML: &str = r#"
metadata:
  id: "@test/inspect"
  name: Inspect
definitions:
  shout:
    kind: component
    pipeline:
      - id: "@brickyard/echo"
        config:
          message: hi
extensionPoints:
  - id: "@brickyard/button"
    label: ok
    config:
      action:
        - id: shout
        - id: "@brickyard/set-page-state"
          config:
            data: {}
  - id: "@brickyard/button"
    label: broken
    config:
      action:
        - id: "@brickyard/for-each"
          config:
            elements: []
            body:
              __type__: pipeline
              __value__:
                - id: "@test/missing"
"#;

    async fn reports(platform: &dyn Platform) -> Vec<ComponentReport> {
        let config = Config::default();
        let registry = build_registry(&config.registry, &[]);
        let definition = parse_mod(MOD_YAML, false, ApiVersion::V3).unwrap();
        let components = resolve_mod(&definition, &registry).unwrap();
        let mut reports = Vec::new();
        for component in &components {
            reports.push(inspect_component(&registry, platform, component).await);
        }
        reports
    }

    #[tokio::test]
    async fn test_runnable_component() {
        let reports = reports(&StaticPlatform::full("test")).await;
        let ok = &reports[0];
        assert_eq!(ok.label, "ok");
        assert!(ok.is_runnable());
        assert!(!ok.analysis.pure);
        assert!(ok.analysis.page_state_aware);
        assert!(ok.analysis.capabilities.contains(&PlatformCapability::State));
    }

    #[tokio::test]
    async fn test_missing_capability_is_reported() {
        let platform = StaticPlatform::new("bare", [PlatformCapability::Http]);
        let reports = reports(&platform).await;
        assert_eq!(reports[0].missing_capabilities, vec![PlatformCapability::State]);
        assert!(!reports[0].is_runnable());
    }

    #[tokio::test]
    async fn test_unknown_brick_in_sub_pipeline() {
        let reports = reports(&StaticPlatform::full("test")).await;
        let broken = &reports[1];
        assert_eq!(broken.unknown_bricks, vec![RegistryId::new("@test/missing").unwrap()]);
        assert!(!broken.is_runnable());
    }
}
