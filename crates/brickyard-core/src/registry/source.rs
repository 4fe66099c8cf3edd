//! Brick sources consulted lazily by the registry.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use brickyard_protocols::{Brick, CompositeBrick, CompositeBrickSpec};

use crate::error::SourceError;

/// Async loader of bricks.
#[async_trait]
pub trait BrickSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Vec<Brick>, SourceError>;
}

/// A fixed set of bricks.
pub struct StaticBrickSource {
    name: String,
    bricks: Vec<Brick>,
}

impl StaticBrickSource {
    pub fn new(name: impl Into<String>, bricks: Vec<Brick>) -> Self {
        Self {
            name: name.into(),
            bricks,
        }
    }
}

#[async_trait]
impl BrickSource for StaticBrickSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<Brick>, SourceError> {
        Ok(self.bricks.clone())
    }
}

/// User-defined bricks stored as YAML or JSON documents in a directory.
pub struct YamlBrickSource {
    name: String,
    dir: PathBuf,
}

impl YamlBrickSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            name: format!("yaml:{}", dir.display()),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parse one brick document.
    pub fn parse(path: &Path, content: &str) -> Result<CompositeBrick, SourceError> {
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let spec: CompositeBrickSpec = if is_json {
            serde_json::from_str(content).map_err(|e| SourceError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yml::from_str(content).map_err(|e| SourceError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };
        Ok(CompositeBrick::from(spec))
    }
}

fn is_brick_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

#[async_trait]
impl BrickSource for YamlBrickSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<Brick>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if is_brick_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut bricks = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;
            bricks.push(Brick::composite(Self::parse(&path, &content)?));
        }
        Ok(bricks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickyard_protocols::ApiVersion;

    const GREET_YAML: &str = r#"
apiVersion: v3
metadata:
  id: "@user/greet"
  name: Greet
pipeline:
  - id: "@brickyard/echo"
    config:
      message:
        __type__: nunjucks
        __value__: "Hello {{ @input.name }}"
"#;

    #[tokio::test]
    async fn test_yaml_source_loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("greet.yaml"), GREET_YAML).unwrap();
        std::fs::write(
            dir.path().join("noop.json"),
            r#"{"metadata": {"id": "@user/noop", "name": "Noop"}, "pipeline": []}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let source = YamlBrickSource::new(dir.path());
        let bricks = source.load().await.unwrap();
        assert_eq!(bricks.len(), 2);
        let greet = bricks[0].as_composite().unwrap();
        assert_eq!(greet.id().as_str(), "@user/greet");
        assert_eq!(greet.api_version(), ApiVersion::V3);
        assert_eq!(bricks[1].id().as_str(), "@user/noop");
    }

    #[tokio::test]
    async fn test_yaml_source_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "metadata: [").unwrap();
        let err = YamlBrickSource::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_yaml_source_missing_dir() {
        let err = YamlBrickSource::new("/nonexistent/brickyard/bricks")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
