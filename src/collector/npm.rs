use crate::model::{PackageRecord, Source};
use crate::parse::{parse_listing, Listing};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;

/// Collects dependencies by running `npm ls` in the project directory.
pub struct NpmLsCollector;

#[async_trait]
impl super::Collector for NpmLsCollector {
    fn name(&self) -> &'static str {
        "npm ls"
    }

    fn source(&self) -> Source {
        Source::Npm
    }

    fn detects(&self, project: &Path) -> bool {
        project.join("package.json").exists()
    }

    async fn collect(&self, project: &Path) -> Result<Vec<PackageRecord>> {
        let npm_cmd = if cfg!(target_os = "windows") { "npm.cmd" } else { "npm" };

        let output = Command::new(npm_cmd)
            .args(["ls", "--all"])
            .current_dir(project)
            .output()
            .context("Failed to execute npm. Is npm installed?")?;

        // npm ls exits nonzero on peer-dep issues but still prints the tree.
        // Only fail when there is no output to parse at all.
        if !output.status.success() && output.stdout.is_empty() {
            anyhow::bail!(
                "npm ls failed in {}: {}",
                project.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_listing(Listing::NpmFlat, &stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detects_package_json() {
        let dir = TempDir::new().unwrap();
        assert!(!NpmLsCollector.detects(dir.path()));
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert!(NpmLsCollector.detects(dir.path()));
    }
}
