use crate::model::{PackageRecord, Source};
use crate::parse::{parse_listing, Listing};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;

/// Collects dependencies by running `yarn list` in the project directory.
pub struct YarnListCollector;

#[async_trait]
impl super::Collector for YarnListCollector {
    fn name(&self) -> &'static str {
        "yarn list"
    }

    fn source(&self) -> Source {
        Source::Yarn
    }

    fn detects(&self, project: &Path) -> bool {
        project.join("yarn.lock").exists()
    }

    async fn collect(&self, project: &Path) -> Result<Vec<PackageRecord>> {
        let yarn_cmd = if cfg!(target_os = "windows") { "yarn.cmd" } else { "yarn" };

        let output = Command::new(yarn_cmd)
            .args(["list", "--depth=Infinity", "--no-progress"])
            .current_dir(project)
            .output()
            .context("Failed to execute yarn. Is yarn installed?")?;

        if !output.status.success() && output.stdout.is_empty() {
            anyhow::bail!(
                "yarn list failed in {}: {}",
                project.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_listing(Listing::YarnTree, &stdout))
    }
}
