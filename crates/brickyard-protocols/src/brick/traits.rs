//! Brick traits and the closed brick enum.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{BrickArgs, BrickDefinition, BrickOptions, CompositeBrick};
use crate::error::BrickError;
use crate::types::{BrickType, PlatformCapability, RegistryId};

/// Declarations shared by every native brick.
///
/// The async defaults are conservative: impure, not root-aware, no page
/// state, no platform requirements.
#[async_trait]
pub trait BrickCore: Send + Sync {
    /// Returns the brick definition.
    fn definition(&self) -> &BrickDefinition;

    /// Whether repeated calls with the same input have no side effects.
    async fn is_pure(&self) -> bool {
        false
    }

    /// Whether the brick reads the ambient root element.
    async fn is_root_aware(&self) -> bool {
        false
    }

    /// Whether the brick reads or writes the shared page state.
    async fn is_page_state_aware(&self) -> bool {
        false
    }

    /// Platform features that must be present before the brick runs.
    async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        Vec::new()
    }
}

/// Reads data from the page.
#[async_trait]
pub trait Reader: BrickCore {
    async fn read(&self, options: BrickOptions) -> Result<Value, BrickError>;
}

/// Computes a value from its arguments.
#[async_trait]
pub trait Transformer: BrickCore {
    async fn transform(&self, args: BrickArgs, options: BrickOptions) -> Result<Value, BrickError>;
}

/// Performs a side effect. Produces no output.
#[async_trait]
pub trait Effect: BrickCore {
    async fn effect(&self, args: BrickArgs, options: BrickOptions) -> Result<(), BrickError>;
}

/// Produces content for a panel or modal.
#[async_trait]
pub trait Renderer: BrickCore {
    async fn render(
        &self,
        args: BrickArgs,
        options: BrickOptions,
    ) -> Result<RendererPayload, BrickError>;
}

/// Renderable output of a renderer brick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum RendererPayload {
    Html(String),
    /// A structured document tree for the host to lay out.
    Document(Value),
}

impl RendererPayload {
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A brick, tagged with its execution capability.
#[derive(Clone)]
pub enum Brick {
    Reader(Arc<dyn Reader>),
    Transformer(Arc<dyn Transformer>),
    Effect(Arc<dyn Effect>),
    Renderer(Arc<dyn Renderer>),
    /// Pipeline-defined brick; its type depends on its last stage.
    Composite(Arc<CompositeBrick>),
}

impl Brick {
    pub fn reader(brick: impl Reader + 'static) -> Self {
        Brick::Reader(Arc::new(brick))
    }

    pub fn transformer(brick: impl Transformer + 'static) -> Self {
        Brick::Transformer(Arc::new(brick))
    }

    pub fn effect(brick: impl Effect + 'static) -> Self {
        Brick::Effect(Arc::new(brick))
    }

    pub fn renderer(brick: impl Renderer + 'static) -> Self {
        Brick::Renderer(Arc::new(brick))
    }

    pub fn composite(brick: CompositeBrick) -> Self {
        Brick::Composite(Arc::new(brick))
    }

    pub fn definition(&self) -> &BrickDefinition {
        match self {
            Brick::Reader(b) => b.definition(),
            Brick::Transformer(b) => b.definition(),
            Brick::Effect(b) => b.definition(),
            Brick::Renderer(b) => b.definition(),
            Brick::Composite(b) => b.definition(),
        }
    }

    pub fn id(&self) -> &RegistryId {
        &self.definition().id
    }

    /// The type of a native brick. Composites need inference.
    pub fn native_type(&self) -> Option<BrickType> {
        match self {
            Brick::Reader(_) => Some(BrickType::Reader),
            Brick::Transformer(_) => Some(BrickType::Transform),
            Brick::Effect(_) => Some(BrickType::Effect),
            Brick::Renderer(_) => Some(BrickType::Renderer),
            Brick::Composite(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Brick::Composite(_))
    }

    pub fn as_composite(&self) -> Option<&Arc<CompositeBrick>> {
        match self {
            Brick::Composite(b) => Some(b),
            _ => None,
        }
    }

    /// Purity of this brick alone. Composites report `false`; use the
    /// pipeline analyzer for a recursive answer.
    pub async fn is_pure(&self) -> bool {
        match self {
            Brick::Reader(b) => b.is_pure().await,
            Brick::Transformer(b) => b.is_pure().await,
            Brick::Effect(b) => b.is_pure().await,
            Brick::Renderer(b) => b.is_pure().await,
            Brick::Composite(_) => false,
        }
    }

    pub async fn is_root_aware(&self) -> bool {
        match self {
            Brick::Reader(b) => b.is_root_aware().await,
            Brick::Transformer(b) => b.is_root_aware().await,
            Brick::Effect(b) => b.is_root_aware().await,
            Brick::Renderer(b) => b.is_root_aware().await,
            Brick::Composite(_) => false,
        }
    }

    pub async fn is_page_state_aware(&self) -> bool {
        match self {
            Brick::Reader(b) => b.is_page_state_aware().await,
            Brick::Transformer(b) => b.is_page_state_aware().await,
            Brick::Effect(b) => b.is_page_state_aware().await,
            Brick::Renderer(b) => b.is_page_state_aware().await,
            Brick::Composite(_) => false,
        }
    }

    /// Capabilities required by this brick alone. Composites declare none
    /// themselves; their stages are checked when they run.
    pub async fn required_capabilities(&self) -> Vec<PlatformCapability> {
        match self {
            Brick::Reader(b) => b.required_capabilities().await,
            Brick::Transformer(b) => b.required_capabilities().await,
            Brick::Effect(b) => b.required_capabilities().await,
            Brick::Renderer(b) => b.required_capabilities().await,
            Brick::Composite(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for Brick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Brick::Reader(_) => "Reader",
            Brick::Transformer(_) => "Transformer",
            Brick::Effect(_) => "Effect",
            Brick::Renderer(_) => "Renderer",
            Brick::Composite(_) => "Composite",
        };
        f.debug_tuple(kind).field(&self.id().as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiVersion;
    use serde_json::json;

    struct PureTransform {
        definition: BrickDefinition,
    }

    impl PureTransform {
        fn new() -> Self {
            Self {
                definition: BrickDefinition::new(
                    RegistryId::new("@test/upper").unwrap(),
                    "Upper",
                    "Uppercases",
                ),
            }
        }
    }

    #[async_trait]
    impl BrickCore for PureTransform {
        fn definition(&self) -> &BrickDefinition {
            &self.definition
        }

        async fn is_pure(&self) -> bool {
            true
        }
    }

    #[async_trait]
    impl Transformer for PureTransform {
        async fn transform(&self, args: BrickArgs, _options: BrickOptions) -> Result<Value, BrickError> {
            Ok(json!(args.get_str("text").unwrap_or_default().to_uppercase()))
        }
    }

    struct Alert {
        definition: BrickDefinition,
    }

    #[async_trait]
    impl BrickCore for Alert {
        fn definition(&self) -> &BrickDefinition {
            &self.definition
        }

        async fn required_capabilities(&self) -> Vec<PlatformCapability> {
            vec![PlatformCapability::Notification]
        }
    }

    #[async_trait]
    impl Effect for Alert {
        async fn effect(&self, _args: BrickArgs, _options: BrickOptions) -> Result<(), BrickError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_native_declarations() {
        let brick = Brick::transformer(PureTransform::new());
        assert_eq!(brick.native_type(), Some(BrickType::Transform));
        assert!(brick.is_pure().await);
        assert!(!brick.is_root_aware().await);
        assert!(brick.required_capabilities().await.is_empty());
        assert_eq!(brick.id().as_str(), "@test/upper");
    }

    #[tokio::test]
    async fn test_defaults_are_conservative() {
        let brick = Brick::effect(Alert {
            definition: BrickDefinition::new(RegistryId::new("@test/alert").unwrap(), "Alert", ""),
        });
        assert!(!brick.is_pure().await);
        assert!(!brick.is_page_state_aware().await);
        assert_eq!(
            brick.required_capabilities().await,
            vec![PlatformCapability::Notification]
        );
    }

    #[tokio::test]
    async fn test_composite_has_no_native_type() {
        let brick = Brick::composite(CompositeBrick::new(
            BrickDefinition::new(RegistryId::new("@user/c").unwrap(), "C", ""),
            ApiVersion::V3,
            Vec::new(),
        ));
        assert!(brick.native_type().is_none());
        assert!(brick.is_composite());
        assert!(!brick.is_pure().await);
        assert_eq!(format!("{brick:?}"), "Composite(\"@user/c\")");
    }

    #[test]
    fn test_renderer_payload_value() {
        let payload = RendererPayload::Html("<b>hi</b>".to_string());
        assert_eq!(payload.into_value(), json!({"kind": "html", "content": "<b>hi</b>"}));
    }
}
