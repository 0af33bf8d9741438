//! Dependency collectors.
//!
//! Collectors are the I/O edge of depscan: they obtain a raw dependency
//! listing for a project — by reading its lockfile or by running the package
//! manager — and hand the text or decoded tree to the parsers in
//! [`crate::parse`].
//!
//! # Available Collectors
//!
//! | Collector | Source | Detects |
//! |-----------|--------|---------|
//! | [`LockfileCollector`] | `package-lock.json` + `package.json` | `package-lock.json` |
//! | [`YarnListCollector`] | `yarn list` output | `yarn.lock` |
//! | [`NpmLsCollector`] | `npm ls` output | `package.json` |
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use depscan::collector::{all_collectors, Collector};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let project = Path::new(".");
//!     for collector in all_collectors() {
//!         if collector.detects(project) {
//!             let records = collector.collect(project).await?;
//!             println!("{}: {} packages", collector.name(), records.len());
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod lockfile;
mod npm;
mod yarn;

pub use lockfile::LockfileCollector;
pub use npm::NpmLsCollector;
pub use yarn::YarnListCollector;

use crate::model::{PackageRecord, Source};
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Trait for obtaining a project's resolved dependencies from one source.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Returns the human-readable name of this collector.
    fn name(&self) -> &'static str;

    /// Returns the source type this collector handles.
    fn source(&self) -> Source;

    /// Returns true if the project directory has what this collector needs.
    fn detects(&self, project: &Path) -> bool;

    /// Collects and normalizes the project's dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be obtained at all (missing
    /// file, undecodable lockfile, or a package-manager command that fails
    /// without producing output). Per-line anomalies inside a listing are
    /// handled by the parsers and never surface here.
    async fn collect(&self, project: &Path) -> Result<Vec<PackageRecord>>;
}

/// Returns all collectors in preference order: the lockfile pair is the most
/// precise source, then yarn, then npm.
pub fn all_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(LockfileCollector),
        Box::new(YarnListCollector),
        Box::new(NpmLsCollector),
    ]
}

/// Returns the collector for a specific source.
pub fn get_collector(source: Source) -> Box<dyn Collector> {
    match source {
        Source::Lockfile => Box::new(LockfileCollector),
        Source::Yarn => Box::new(YarnListCollector),
        Source::Npm => Box::new(NpmLsCollector),
    }
}

/// Collects dependencies for a project with the first collector that detects
/// a usable input.
pub async fn collect_for_project(project: &Path) -> Result<(Source, Vec<PackageRecord>)> {
    for collector in all_collectors() {
        if collector.detects(project) {
            debug!(
                project = %project.display(),
                collector = collector.name(),
                "collecting dependencies"
            );
            let records = collector.collect(project).await?;
            return Ok((collector.source(), records));
        }
    }
    anyhow::bail!("no dependency listing found in {}", project.display())
}

/// Finds project directories under `root` by locating `package.json` files,
/// skipping `node_modules` and hidden directories.
pub fn discover_projects(root: &Path) -> Vec<PathBuf> {
    let mut projects = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        name != "node_modules" && !(entry.depth() > 0 && name.starts_with('.'))
    });

    for entry in walker.flatten() {
        if entry.file_type().is_file() && entry.file_name() == "package.json" {
            if let Some(parent) = entry.path().parent() {
                projects.push(parent.to_path_buf());
            }
        }
    }

    projects.sort();
    projects
}
