//! Shared page state.

use async_trait::async_trait;
use brickyard_protocols::{
    BrickArgs, BrickCore, BrickDefinition, BrickError, BrickOptions, PlatformCapability,
    RegistryId, Transformer,
};
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{schema_of, GET_PAGE_STATE, SET_PAGE_STATE};

/// Namespace used when a brick does not name one.
pub const DEFAULT_NAMESPACE: &str = "shared";

/// How a write combines with the existing state of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Replace the whole namespace.
    Replace,
    /// Overwrite top-level keys.
    #[default]
    Shallow,
    /// Merge nested objects recursively.
    Deep,
}

/// Namespaced key-value state shared by every run on a page.
///
/// Each write is applied atomically; concurrent writers to the same key
/// resolve last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct PageStateStore {
    namespaces: Arc<DashMap<String, Value>>,
}

impl PageStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a namespace; an empty object if it was never set.
    pub fn get(&self, namespace: &str) -> Value {
        self.namespaces
            .get(namespace)
            .map(|state| state.value().clone())
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Write `data` into a namespace and return the resulting state.
    pub fn set(&self, namespace: &str, data: Value, strategy: MergeStrategy) -> Value {
        let mut entry = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match strategy {
            MergeStrategy::Replace => *entry = data,
            MergeStrategy::Shallow => match (entry.value_mut(), data) {
                (Value::Object(current), Value::Object(update)) => current.extend(update),
                (current, data) => *current = data,
            },
            MergeStrategy::Deep => deep_merge(entry.value_mut(), data),
        }
        entry.value().clone()
    }

    pub fn clear(&self, namespace: &str) {
        self.namespaces.remove(namespace);
    }
}

fn deep_merge(current: &mut Value, update: Value) {
    match (current, update) {
        (Value::Object(current), Value::Object(update)) => {
            for (key, value) in update {
                match current.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (current, update) => *current = update,
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetArgs {
    /// State namespace.
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SetArgs {
    /// State namespace.
    #[serde(default)]
    namespace: Option<String>,
    /// Values to write.
    data: Value,
    #[serde(default)]
    merge_strategy: MergeStrategy,
}

/// Reads a namespace of the page state.
pub struct GetPageStateBrick {
    definition: BrickDefinition,
    state: PageStateStore,
}

impl GetPageStateBrick {
    pub fn new(state: PageStateStore) -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(GET_PAGE_STATE),
                "Get Page State",
                "Read the shared page state",
            )
            .with_input_schema(schema_of::<GetArgs>()),
            state,
        }
    }
}

#[async_trait]
impl BrickCore for GetPageStateBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    async fn is_page_state_aware(&self) -> bool {
        true
    }

    async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        vec![PlatformCapability::State]
    }
}

#[async_trait]
impl Transformer for GetPageStateBrick {
    async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
        let args: GetArgs = args.deserialize()?;
        Ok(self
            .state
            .get(args.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)))
    }
}

/// Writes into a namespace of the page state and returns the new state.
pub struct SetPageStateBrick {
    definition: BrickDefinition,
    state: PageStateStore,
}

impl SetPageStateBrick {
    pub fn new(state: PageStateStore) -> Self {
        Self {
            definition: BrickDefinition::new(
                RegistryId::builtin(SET_PAGE_STATE),
                "Set Page State",
                "Write to the shared page state",
            )
            .with_input_schema(schema_of::<SetArgs>()),
            state,
        }
    }
}

#[async_trait]
impl BrickCore for SetPageStateBrick {
    fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    async fn is_page_state_aware(&self) -> bool {
        true
    }

    async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        vec![PlatformCapability::State]
    }
}

#[async_trait]
impl Transformer for SetPageStateBrick {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError> {
        let args: SetArgs = args.deserialize()?;
        let namespace = args.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        options.logger.debug(&format!(
            "Writing page state namespace '{namespace}' ({:?})",
            args.merge_strategy
        ));
        Ok(self.state.set(namespace, args.data, args.merge_strategy))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::options;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_strategies() {
        let store = PageStateStore::new();
        store.set("ns", json!({"a": {"x": 1, "y": 2}, "b": 1}), MergeStrategy::Replace);

        let shallow = store.set("ns", json!({"a": {"x": 9}}), MergeStrategy::Shallow);
        assert_eq!(shallow, json!({"a": {"x": 9}, "b": 1}));

        store.set("ns", json!({"a": {"x": 1, "y": 2}, "b": 1}), MergeStrategy::Replace);
        let deep = store.set("ns", json!({"a": {"x": 9}, "c": [1]}), MergeStrategy::Deep);
        assert_eq!(deep, json!({"a": {"x": 9, "y": 2}, "b": 1, "c": [1]}));

        let replaced = store.set("ns", json!({"only": true}), MergeStrategy::Replace);
        assert_eq!(replaced, json!({"only": true}));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = PageStateStore::new();
        store.set("one", json!({"k": 1}), MergeStrategy::Shallow);
        assert_eq!(store.get("two"), json!({}));
        assert_eq!(store.get("one"), json!({"k": 1}));
        store.clear("one");
        assert_eq!(store.get("one"), json!({}));
    }

    #[test]
    fn test_deep_merge_replaces_non_objects() {
        let mut current = json!({"list": [1, 2], "n": {"deep": 1}});
        deep_merge(&mut current, json!({"list": [3], "n": 5}));
        assert_eq!(current, json!({"list": [3], "n": 5}));
    }

    #[tokio::test]
    async fn test_last_write_wins_across_tasks() {
        let store = PageStateStore::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let data = json!({(format!("k{i}")): i, "last": i});
                    store.set(DEFAULT_NAMESPACE, data, MergeStrategy::Shallow);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let state = store.get(DEFAULT_NAMESPACE);
        let obj = state.as_object().unwrap();
        assert_eq!(obj.len(), 17);
        assert!(obj["last"].as_u64().unwrap() < 16);
    }

    #[tokio::test]
    async fn test_page_state_bricks() {
        let store = PageStateStore::new();
        let set = SetPageStateBrick::new(store.clone());
        let get = GetPageStateBrick::new(store.clone());

        let args = BrickArgs::new()
            .with("namespace", "cart")
            .with("data", json!({"items": 2}))
            .with("mergeStrategy", "deep");
        assert_eq!(set.transform(args, options()).await.unwrap(), json!({"items": 2}));

        let read = get
            .transform(BrickArgs::new().with("namespace", "cart"), options())
            .await
            .unwrap();
        assert_eq!(read, json!({"items": 2}));
        assert!(set.is_page_state_aware().await);
        assert_eq!(get.required_capabilities().await, vec![PlatformCapability::State]);
    }
}
