//! Host platform capabilities.

use std::collections::BTreeSet;

use crate::types::PlatformCapability;

/// The environment a pipeline runs in.
pub trait Platform: Send + Sync {
    /// Short platform name for logs, e.g. `contentScript`.
    fn name(&self) -> &str;

    /// Capabilities this host provides.
    fn capabilities(&self) -> Vec<PlatformCapability>;

    fn has_capability(&self, capability: PlatformCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Required capabilities this host lacks, in the order given.
    fn missing_capabilities(&self, required: &[PlatformCapability]) -> Vec<PlatformCapability> {
        let available = self.capabilities();
        let mut missing: Vec<PlatformCapability> = required
            .iter()
            .filter(|c| !available.contains(c))
            .copied()
            .collect();
        missing.dedup();
        missing
    }
}

/// A platform with a fixed capability set.
#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    name: String,
    capabilities: BTreeSet<PlatformCapability>,
}

impl StaticPlatform {
    pub fn new(
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = PlatformCapability>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// A platform providing every capability.
    pub fn full(name: impl Into<String>) -> Self {
        Self::new(name, PlatformCapability::ALL)
    }

    /// A platform with no document access, such as a background worker.
    pub fn headless(name: impl Into<String>) -> Self {
        Self::new(
            name,
            [
                PlatformCapability::Http,
                PlatformCapability::State,
                PlatformCapability::Sandbox,
            ],
        )
    }

    pub fn with_capability(mut self, capability: PlatformCapability) -> Self {
        self.capabilities.insert(capability);
        self
    }
}

impl Platform for StaticPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Vec<PlatformCapability> {
        self.capabilities.iter().copied().collect()
    }

    fn has_capability(&self, capability: PlatformCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}
