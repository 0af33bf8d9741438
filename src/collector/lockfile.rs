use crate::model::{PackageRecord, Source};
use crate::parse::{parse_lockfile, DependencyTree, PackageManifest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Collects dependencies from a `package-lock.json` / `package.json` pair.
///
/// This is the preferred source: the lockfile pins every version and carries
/// integrity hashes, and the manifest supplies the direct/dev declarations
/// used to classify the flattened tree.
pub struct LockfileCollector;

#[async_trait]
impl super::Collector for LockfileCollector {
    fn name(&self) -> &'static str {
        "package-lock.json"
    }

    fn source(&self) -> Source {
        Source::Lockfile
    }

    fn detects(&self, project: &Path) -> bool {
        project.join("package-lock.json").exists()
    }

    async fn collect(&self, project: &Path) -> Result<Vec<PackageRecord>> {
        let lock_path = project.join("package-lock.json");
        let content = fs::read_to_string(&lock_path)
            .with_context(|| format!("Failed to read {}", lock_path.display()))?;
        let tree: DependencyTree = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", lock_path.display()))?;

        // The manifest is optional; without it every record stays transitive.
        let manifest_path = project.join("package.json");
        let manifest = match fs::read_to_string(&manifest_path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", manifest_path.display()))?,
            Err(_) => {
                debug!(project = %project.display(), "no readable package.json, skipping reconciliation");
                PackageManifest::default()
            }
        };

        Ok(parse_lockfile(&tree, &manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::model::DependencyType;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(lock: &str, manifest: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package-lock.json"), lock).unwrap();
        if let Some(manifest) = manifest {
            fs::write(dir.path().join("package.json"), manifest).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_collect_classifies_against_manifest() {
        let dir = write_project(
            r#"{
                "name": "fixture",
                "dependencies": {
                    "express": {
                        "version": "4.18.0",
                        "dependencies": { "debug": { "version": "4.3.4" } }
                    },
                    "jest": { "version": "29.0.0", "dev": true }
                }
            }"#,
            Some(
                r#"{
                    "dependencies": { "express": "^4.18.0" },
                    "devDependencies": { "jest": "^29.0.0" }
                }"#,
            ),
        );

        let records = LockfileCollector.collect(dir.path()).await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["debug", "express", "jest"]);

        let express = records.iter().find(|r| r.name == "express").unwrap();
        let debug = records.iter().find(|r| r.name == "debug").unwrap();
        let jest = records.iter().find(|r| r.name == "jest").unwrap();

        assert!(!express.transitive);
        assert!(debug.transitive);
        assert!(!jest.transitive);
        assert_eq!(jest.dependency_type, DependencyType::DevDependency);
    }

    #[tokio::test]
    async fn test_collect_without_manifest() {
        let dir = write_project(
            r#"{ "dependencies": { "lodash": { "version": "4.17.21" } } }"#,
            None,
        );

        let records = LockfileCollector.collect(dir.path()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].transitive);
    }

    #[tokio::test]
    async fn test_collect_empty_lockfile() {
        let dir = write_project(r#"{ "name": "fixture" }"#, Some("{}"));
        let records = LockfileCollector.collect(dir.path()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_collect_rejects_invalid_lockfile() {
        let dir = write_project("not json", None);
        assert!(LockfileCollector.collect(dir.path()).await.is_err());
    }

    #[test]
    fn test_detects() {
        let dir = write_project("{}", None);
        assert!(LockfileCollector.detects(dir.path()));
        let empty = TempDir::new().unwrap();
        assert!(!LockfileCollector.detects(empty.path()));
    }
}
