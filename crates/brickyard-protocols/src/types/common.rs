//! Small shared types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution capability of a brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrickType {
    Reader,
    Transform,
    Effect,
    Renderer,
}

impl BrickType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrickType::Reader => "reader",
            BrickType::Transform => "transform",
            BrickType::Effect => "effect",
            BrickType::Renderer => "renderer",
        }
    }
}

impl fmt::Display for BrickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host platform feature a brick may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformCapability {
    /// Access to the document of the current frame.
    Dom,
    /// Running inside an extension content script.
    ContentScript,
    /// Running code in the page's own JavaScript context.
    PageScript,
    /// Outbound network requests.
    Http,
    Clipboard,
    Notification,
    /// Shared page-level state store.
    State,
    /// Sandboxed template evaluation.
    Sandbox,
}

impl PlatformCapability {
    pub const ALL: [PlatformCapability; 8] = [
        PlatformCapability::Dom,
        PlatformCapability::ContentScript,
        PlatformCapability::PageScript,
        PlatformCapability::Http,
        PlatformCapability::Clipboard,
        PlatformCapability::Notification,
        PlatformCapability::State,
        PlatformCapability::Sandbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformCapability::Dom => "dom",
            PlatformCapability::ContentScript => "content-script",
            PlatformCapability::PageScript => "page-script",
            PlatformCapability::Http => "http",
            PlatformCapability::Clipboard => "clipboard",
            PlatformCapability::Notification => "notification",
            PlatformCapability::State => "state",
            PlatformCapability::Sandbox => "sandbox",
        }
    }
}

/// Opaque handle to an element owned by the host document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

/// The element a root-aware brick operates on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "element")]
pub enum Root {
    /// The frame's document.
    #[default]
    Document,
    Element(ElementRef),
}

/// Id of the top-level frame of a tab.
pub const TOP_FRAME_ID: u32 = 0;

/// A specific frame in a specific tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLocation {
    pub tab_id: u32,
    pub frame_id: u32,
}

impl FrameLocation {
    pub fn new(tab_id: u32, frame_id: u32) -> Self {
        Self { tab_id, frame_id }
    }

    pub fn top(tab_id: u32) -> Self {
        Self::new(tab_id, TOP_FRAME_ID)
    }

    pub fn is_top(&self) -> bool {
        self.frame_id == TOP_FRAME_ID
    }
}

impl fmt::Display for FrameLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {} frame {}", self.tab_id, self.frame_id)
    }
}

/// Logical extension contexts that are not tied to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Background,
    Sidebar,
}
