use super::*;
use async_trait::async_trait;
use brickyard_protocols::{
    ApiVersion, BrickArgs, BrickConfig, BrickCore, BrickDefinition, BrickError, BrickOptions,
    CompositeBrick, ConfigValue, Effect, Reader, Transformer,
};
use serde_json::Value;

struct PureTransform(BrickDefinition);

#[async_trait]
impl BrickCore for PureTransform {
    fn definition(&self) -> &BrickDefinition {
        &self.0
    }

    async fn is_pure(&self) -> bool {
        true
    }
}

#[async_trait]
impl Transformer for PureTransform {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        Ok(args.into_value())
    }
}

struct DomReader(BrickDefinition);

#[async_trait]
impl BrickCore for DomReader {
    fn definition(&self) -> &BrickDefinition {
        &self.0
    }

    async fn is_pure(&self) -> bool {
        true
    }

    async fn is_root_aware(&self) -> bool {
        true
    }

    async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        vec![PlatformCapability::Dom]
    }
}

#[async_trait]
impl Reader for DomReader {
    async fn read(&self, _options: BrickOptions) -> Result<Value, BrickError> {
        Ok(Value::Null)
    }
}

struct SetState(BrickDefinition);

#[async_trait]
impl BrickCore for SetState {
    fn definition(&self) -> &BrickDefinition {
        &self.0
    }

    async fn is_page_state_aware(&self) -> bool {
        true
    }

    async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        vec![PlatformCapability::State]
    }
}

#[async_trait]
impl Effect for SetState {
    async fn effect(&self, _args: BrickArgs, _options: BrickOptions) -> Result<(), BrickError> {
        Ok(())
    }
}

fn id(value: &str) -> RegistryId {
    RegistryId::new(value).unwrap()
}

fn def(value: &str) -> BrickDefinition {
    BrickDefinition::new(id(value), value, "")
}

fn stage(value: &str) -> BrickConfig {
    BrickConfig::new(id(value))
}

fn registry() -> BrickRegistry {
    let registry = BrickRegistry::new();
    registry.register([
        Brick::transformer(PureTransform(def("@test/pure"))),
        Brick::reader(DomReader(def("@test/dom"))),
        Brick::effect(SetState(def("@test/set-state"))),
        Brick::effect(SetState(def("@brickyard/error"))),
        Brick::composite(CompositeBrick::new(
            def("@user/reads"),
            ApiVersion::V3,
            vec![stage("@test/pure"), stage("@test/dom")],
        )),
        Brick::composite(CompositeBrick::new(
            def("@user/loop"),
            ApiVersion::V3,
            vec![stage("@user/loop")],
        )),
    ]);
    registry
}

#[tokio::test]
async fn test_pure_pipeline() {
    let analyzer = PipelineAnalyzer::new(registry());
    let analysis = analyzer.analyze(&vec![stage("@test/pure")]).await;
    assert!(analysis.pure);
    assert!(!analysis.root_aware);
    assert!(analysis.capabilities.is_empty());
}

#[tokio::test]
async fn test_composite_is_analyzed_recursively() {
    let analyzer = PipelineAnalyzer::new(registry());
    let analysis = analyzer.analyze(&vec![stage("@user/reads")]).await;
    assert!(analysis.pure);
    assert!(analysis.root_aware);
    assert_eq!(
        analyzer.required_capabilities(&vec![stage("@user/reads")]).await,
        vec![PlatformCapability::Dom]
    );
}

#[tokio::test]
async fn test_sub_pipelines_are_included() {
    let analyzer = PipelineAnalyzer::new(registry());
    let pipeline = vec![stage("@test/pure").with_arg(
        "body",
        ConfigValue::pipeline(vec![stage("@test/set-state")]),
    )];
    let analysis = analyzer.analyze(&pipeline).await;
    assert!(!analysis.pure);
    assert!(analysis.page_state_aware);
    assert!(analysis.capabilities.contains(&PlatformCapability::State));
}

#[tokio::test]
async fn test_unknown_brick_is_conservative() {
    let analyzer = PipelineAnalyzer::new(registry());
    let analysis = analyzer.analyze(&vec![stage("@test/unknown")]).await;
    assert!(!analysis.pure);
    assert!(analysis.root_aware);
}

#[tokio::test]
async fn test_self_referencing_composite_terminates() {
    let analyzer = PipelineAnalyzer::new(registry());
    assert!(analyzer.is_pure(&vec![stage("@user/loop")]).await);
}

#[tokio::test]
async fn test_flavor_check() {
    let registry = registry();
    let typed = registry.all_typed().await;
    let pipeline = vec![
        stage("@test/pure"),
        stage("@test/set-state"),
        stage("@brickyard/error"),
        stage("@test/unknown"),
    ];
    let violations = check_pipeline_flavor(&pipeline, PipelineFlavor::NoEffect, &typed);
    assert_eq!(
        violations,
        vec![FlavorViolation {
            stage_index: 1,
            brick_id: id("@test/set-state"),
            brick_type: BrickType::Effect,
        }]
    );
    assert!(check_pipeline_flavor(&pipeline, PipelineFlavor::AllBricks, &typed).is_empty());
}
