use super::*;
use async_trait::async_trait;
use brickyard_protocols::{
    ApiVersion, BrickArgs, BrickConfig, BrickCore, BrickDefinition, BrickOptions, CompositeBrick,
    Transformer,
};
use serde_json::Value;

use crate::registry::StaticBrickSource;

struct Identity(BrickDefinition);

#[async_trait]
impl BrickCore for Identity {
    fn definition(&self) -> &BrickDefinition {
        &self.0
    }
}

#[async_trait]
impl Transformer for Identity {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        Ok(args.into_value())
    }
}

fn id(value: &str) -> RegistryId {
    RegistryId::new(value).unwrap()
}

fn identity(value: &str) -> Brick {
    Brick::transformer(Identity(BrickDefinition::new(id(value), value, "")))
}

fn composite(own: &str, stages: &[&str]) -> Brick {
    Brick::composite(CompositeBrick::new(
        BrickDefinition::new(id(own), own, ""),
        ApiVersion::V3,
        stages.iter().map(|s| BrickConfig::new(id(s))).collect(),
    ))
}

#[test]
fn test_registry_new() {
    let registry = BrickRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_register_and_get() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a"), identity("@test/b")]);
    assert_eq!(registry.len(), 2);
    assert!(registry.contains(&id("@test/a")));
    assert_eq!(registry.ids(), vec![id("@test/a"), id("@test/b")]);
}

#[test]
fn test_register_replaces_existing() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a")]);
    registry.register([composite("@test/a", &["@test/b"])]);
    assert_eq!(registry.len(), 1);
    assert!(registry.get(&id("@test/a")).unwrap().is_composite());
}

#[test]
fn test_clones_share_storage() {
    let registry = BrickRegistry::new();
    let clone = registry.clone();
    clone.register([identity("@test/a")]);
    assert!(registry.contains(&id("@test/a")));
}

#[tokio::test]
async fn test_lookup_missing_is_brick_not_found() {
    let registry = BrickRegistry::new();
    let err = registry.lookup(&id("@test/missing")).await.unwrap_err();
    assert!(matches!(err, BrickError::BrickNotFound(ref missing) if *missing == id("@test/missing")));
}

#[tokio::test]
async fn test_lookup_loads_sources() {
    let registry = BrickRegistry::new();
    registry.add_source(Arc::new(StaticBrickSource::new(
        "static",
        vec![identity("@test/lazy")],
    )));
    assert!(!registry.contains(&id("@test/lazy")));
    let brick = registry.lookup(&id("@test/lazy")).await.unwrap();
    assert_eq!(brick.id(), &id("@test/lazy"));
}

#[tokio::test]
async fn test_remove() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a")]);
    assert!(registry.remove(&id("@test/a")));
    assert!(!registry.remove(&id("@test/a")));
    assert!(registry.all().await.is_empty());
}

#[tokio::test]
async fn test_all_typed_infers_composites() {
    let registry = BrickRegistry::new();
    registry.register([
        identity("@test/a"),
        composite("@user/wrapper", &["@test/a"]),
        composite("@user/broken", &["@test/missing"]),
    ]);
    let typed = registry.all_typed().await;
    assert_eq!(typed.len(), 2);
    assert_eq!(typed[&id("@user/wrapper")].brick_type, BrickType::Transform);
    assert!(!typed.contains_key(&id("@user/broken")));
}

#[tokio::test]
async fn test_all_typed_is_cached_until_change() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a")]);
    let first = registry.all_typed().await;
    let second = registry.all_typed().await;
    assert!(Arc::ptr_eq(&first, &second));

    registry.register([identity("@test/b")]);
    let third = registry.all_typed().await;
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.len(), 2);
}

#[tokio::test]
async fn test_concurrent_all_typed_share_result() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a"), composite("@user/c", &["@test/a"])]);
    let (a, b) = tokio::join!(registry.all_typed(), registry.all_typed());
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_clear_resets_everything() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a")]);
    let before = registry.all_typed().await;
    assert_eq!(before.len(), 1);

    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.all_typed().await.is_empty());
}

#[tokio::test]
async fn test_clear_reloads_sources_on_demand() {
    let registry = BrickRegistry::new();
    registry.add_source(Arc::new(StaticBrickSource::new(
        "static",
        vec![identity("@test/lazy")],
    )));
    assert_eq!(registry.all().await.len(), 1);
    registry.clear();
    assert!(registry.is_empty());
    assert_eq!(registry.all().await.len(), 1);
}

#[tokio::test]
async fn test_subscribe_receives_events() {
    let registry = BrickRegistry::new();
    let mut events = registry.subscribe();
    registry.register([identity("@test/a")]);
    registry.remove(&id("@test/a"));
    registry.clear();

    assert_eq!(
        events.recv().await.unwrap(),
        RegistryEvent::Registered(vec![id("@test/a")])
    );
    assert_eq!(events.recv().await.unwrap(), RegistryEvent::Removed(id("@test/a")));
    assert_eq!(events.recv().await.unwrap(), RegistryEvent::Cleared);
}

#[test]
fn test_infer_single_brick() {
    let registry = BrickRegistry::new();
    registry.register([identity("@test/a")]);
    let wrapper = composite("@user/w", &["@test/a"]);
    assert_eq!(registry.infer(&wrapper).unwrap(), BrickType::Transform);
    assert!(registry.infer(&composite("@user/x", &["@test/none"])).is_err());
}
