//! Registry, platform and interpreter wiring for the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use brickyard_config::{Config, PlatformConfig, RegistryConfig, TraceBackend, TraceConfig};
use brickyard_core::{BrickRegistry, ModDefinition, ResolvedModComponent, YamlBrickSource};
use brickyard_messenger::{Dispatcher, LocalMessenger};
use brickyard_protocols::{ApiVersion, FrameLocation, StaticPlatform, TraceRecord};
use brickyard_runtime::{
    register_builtins, InMemoryTraceSink, InterpreterSettings, NoopTraceSink, PageStateStore,
    PipelineInterpreter, RemoteBrickHandler, SqliteTraceSink, TraceSink,
};

/// The tab the command line runs in. Its top frame is served in-process.
pub(crate) const CLI_TAB: u32 = 0;

/// Registry with the builtin bricks plus every configured brick directory.
pub(crate) fn build_registry(config: &RegistryConfig, extra_dirs: &[PathBuf]) -> BrickRegistry {
    let registry = BrickRegistry::new();
    register_builtins(&registry, PageStateStore::new());
    for dir in config.brick_dirs.iter().chain(extra_dirs) {
        info!(dir = %dir.display(), "Adding brick directory");
        registry.add_source(Arc::new(YamlBrickSource::new(dir.clone())));
    }
    registry
}

pub(crate) fn build_platform(config: &PlatformConfig) -> StaticPlatform {
    match &config.capabilities {
        Some(capabilities) => StaticPlatform::new(config.name.clone(), capabilities.iter().copied()),
        None => StaticPlatform::full(config.name.clone()),
    }
}

pub(crate) fn interpreter_settings(config: &Config) -> InterpreterSettings {
    InterpreterSettings {
        max_depth: config.runtime.max_depth,
        validate_output: config.runtime.validate_output,
        dispatch_timeout: Some(config.dispatch.timeout()),
    }
}

/// Build the interpreter a run uses.
///
/// Stages that target the top frame or every frame of [`CLI_TAB`] are sent
/// through an in-process messenger to a second interpreter over the same
/// registry, so window targets behave as they would in a single-frame tab.
pub(crate) fn build_interpreter(
    config: &Config,
    registry: BrickRegistry,
    trace: Arc<dyn TraceSink>,
) -> PipelineInterpreter {
    let platform = Arc::new(build_platform(&config.platform));
    let settings = interpreter_settings(config);
    let frame = PipelineInterpreter::new(registry.clone())
        .with_platform(platform.clone())
        .with_trace_sink(trace.clone())
        .with_settings(settings.clone());

    PipelineInterpreter::new(registry)
        .with_platform(platform)
        .with_trace_sink(trace)
        .with_settings(settings)
        .with_dispatcher(local_dispatcher(frame, config.dispatch.timeout()))
}

fn local_dispatcher(frame: PipelineInterpreter, timeout: Duration) -> Dispatcher {
    let messenger = LocalMessenger::new();
    messenger.register(
        FrameLocation::top(CLI_TAB),
        Arc::new(RemoteBrickHandler::new(frame)),
    );
    Dispatcher::new(Arc::new(messenger.clone()), Arc::new(messenger)).with_default_timeout(timeout)
}

/// Where stage records go for a run.
pub(crate) enum TraceStore {
    Disabled,
    Memory(Arc<InMemoryTraceSink>),
    Sqlite(Arc<SqliteTraceSink>),
}

impl TraceStore {
    pub(crate) async fn open(config: &TraceConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::Disabled);
        }
        match config.backend {
            TraceBackend::Memory => Ok(Self::Memory(Arc::new(InMemoryTraceSink::new()))),
            TraceBackend::Sqlite => {
                if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create trace directory {}", parent.display())
                    })?;
                }
                let sink = SqliteTraceSink::open(&config.path)
                    .await
                    .with_context(|| format!("Failed to open trace database {}", config.path.display()))?;
                debug!(path = %config.path.display(), "Opened trace database");
                Ok(Self::Sqlite(Arc::new(sink)))
            }
        }
    }

    pub(crate) fn sink(&self) -> Arc<dyn TraceSink> {
        match self {
            Self::Disabled => Arc::new(NoopTraceSink),
            Self::Memory(sink) => sink.clone(),
            Self::Sqlite(sink) => sink.clone(),
        }
    }

    pub(crate) async fn records_for_run(&self, run_id: Uuid) -> Result<Vec<TraceRecord>> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Memory(sink) => Ok(sink.records_for_run(run_id)),
            Self::Sqlite(sink) => Ok(sink.records_for_run(run_id).await?),
        }
    }
}

/// Load a mod document, choosing the parser from the file extension.
///
/// Documents without an `apiVersion` get `default_api_version`.
pub(crate) fn load_mod(path: &Path, default_api_version: ApiVersion) -> Result<ModDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mod document {}", path.display()))?;
    parse_mod(&content, is_json(path), default_api_version)
        .with_context(|| format!("Invalid mod document {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub(crate) fn parse_mod(
    content: &str,
    json: bool,
    default_api_version: ApiVersion,
) -> Result<ModDefinition> {
    let mut raw: Value = if json {
        serde_json::from_str(content)?
    } else {
        serde_yml::from_str(content)?
    };
    if let Value::Object(obj) = &mut raw {
        obj.entry("apiVersion")
            .or_insert_with(|| json!(default_api_version));
    }
    Ok(serde_json::from_value(raw)?)
}

/// Pick a component by zero-based index or by label; the first one otherwise.
pub(crate) fn select_component<'a>(
    components: &'a [ResolvedModComponent],
    selector: Option<&str>,
) -> Result<&'a ResolvedModComponent> {
    let Some(selector) = selector else {
        return components.first().context("Mod has no components");
    };
    if let Ok(index) = selector.parse::<usize>() {
        return components.get(index).with_context(|| {
            format!("Component index {index} out of range ({} components)", components.len())
        });
    }
    match components.iter().find(|c| c.label == selector) {
        Some(component) => Ok(component),
        None => {
            let labels: Vec<&str> = components.iter().map(|c| c.label.as_str()).collect();
            bail!("No component labelled '{selector}' (available: {})", labels.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickyard_config::ConfigLoader;
    use brickyard_core::resolve_mod;
    use brickyard_protocols::{Platform, PlatformCapability};

    const MOD_YAML: &str = r#"
metadata:
  id: "@test/greeter"
  name: Greeter
extensionPoints:
  - id: "@brickyard/button"
    label: first
    config:
      action:
        - id: "@brickyard/identity"
  - id: "@brickyard/button"
    label: second
    config:
      action: []
"#;

    fn components() -> Vec<ResolvedModComponent> {
        let definition = parse_mod(MOD_YAML, false, ApiVersion::V3).unwrap();
        resolve_mod(&definition, &BrickRegistry::new()).unwrap()
    }

    #[test]
    fn test_parse_mod_applies_default_api_version() {
        let definition = parse_mod(MOD_YAML, false, ApiVersion::V3).unwrap();
        assert_eq!(definition.api_version, ApiVersion::V3);

        let explicit = format!("apiVersion: v2\n{MOD_YAML}");
        let definition = parse_mod(&explicit, false, ApiVersion::V3).unwrap();
        assert_eq!(definition.api_version, ApiVersion::V2);
    }

    #[test]
    fn test_parse_json_mod() {
        let content = r#"{"metadata": {"id": "@test/m", "name": "M"}, "extensionPoints": []}"#;
        let definition = parse_mod(content, true, ApiVersion::V1).unwrap();
        assert_eq!(definition.metadata.name, "M");
        assert!(parse_mod(content, false, ApiVersion::V1).is_ok());
        assert!(parse_mod("not: [json", true, ApiVersion::V1).is_err());
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("mod.JSON")));
        assert!(!is_json(Path::new("mod.yaml")));
        assert!(!is_json(Path::new("mod")));
    }

    #[test]
    fn test_select_component() {
        let components = components();
        assert_eq!(select_component(&components, None).unwrap().label, "first");
        assert_eq!(select_component(&components, Some("1")).unwrap().label, "second");
        assert_eq!(select_component(&components, Some("second")).unwrap().label, "second");
        assert!(select_component(&components, Some("7")).is_err());

        let err = select_component(&components, Some("third")).unwrap_err();
        assert!(err.to_string().contains("first, second"));
        assert!(select_component(&[], None).is_err());
    }

    #[test]
    fn test_build_platform() {
        let full = build_platform(&PlatformConfig::default());
        assert!(full.has_capability(PlatformCapability::Dom));

        let config = PlatformConfig {
            name: "worker".to_string(),
            capabilities: Some(vec![PlatformCapability::Http]),
        };
        let platform = build_platform(&config);
        assert!(platform.has_capability(PlatformCapability::Http));
        assert!(!platform.has_capability(PlatformCapability::Dom));
    }

    #[test]
    fn test_interpreter_settings_follow_config() {
        let config = ConfigLoader::load_str("[runtime]\nmax_depth = 8\n[dispatch]\ntimeout_ms = 500\n")
            .unwrap();
        let settings = interpreter_settings(&config);
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.dispatch_timeout, Some(Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn test_trace_store_backends() {
        let disabled = TraceConfig {
            enabled: false,
            ..TraceConfig::default()
        };
        assert!(matches!(TraceStore::open(&disabled).await.unwrap(), TraceStore::Disabled));

        let memory = TraceStore::open(&TraceConfig::default()).await.unwrap();
        assert!(matches!(memory, TraceStore::Memory(_)));
        assert!(memory.records_for_run(Uuid::new_v4()).await.unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let sqlite = TraceConfig {
            enabled: true,
            backend: TraceBackend::Sqlite,
            path: dir.path().join("nested").join("traces.db"),
        };
        let store = TraceStore::open(&sqlite).await.unwrap();
        assert!(matches!(store, TraceStore::Sqlite(_)));
        assert!(sqlite.path.exists());
    }
}
