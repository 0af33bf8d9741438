use serde::{Deserialize, Serialize};

/// Where a set of dependency records was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Lockfile,
    Yarn,
    Npm,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Lockfile => "lockfile",
            Source::Yarn => "yarn",
            Source::Npm => "npm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Lockfile => "package-lock.json",
            Source::Yarn => "yarn list",
            Source::Npm => "npm ls",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How a package was declared in the analyzed project.
///
/// `Dependency` covers packages needed at runtime; `DevDependency` covers
/// packages only used for development or builds. Transitive packages default
/// to `Dependency` unless the lockfile marks them as dev-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    Dependency,
    DevDependency,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Dependency => "dependency",
            DependencyType::DevDependency => "devDependency",
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single resolved package, normalized from whichever listing produced it.
///
/// Identity is the package URL returned by [`purl`](PackageRecord::purl):
/// two records describe the same package exactly when their purls are equal.
/// `name` and `version` never change after construction; the classification
/// flags are corrected against the project manifest before a record set is
/// handed to callers.
///
/// # Example
///
/// ```
/// use depscan::model::PackageRecord;
///
/// let record = PackageRecord::new("@types/node", "20.11.5");
/// assert_eq!(record.purl(), "pkg:npm/@types/node@20.11.5");
/// assert!(record.transitive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    pub transitive: bool,
    pub dependency_type: DependencyType,
}

impl PackageRecord {
    /// Creates a record with the default classification: transitive runtime
    /// dependency, no integrity hash.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            integrity: None,
            transitive: true,
            dependency_type: DependencyType::Dependency,
        }
    }

    pub fn with_integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    pub fn with_dependency_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// The canonical package URL for this record, e.g. `pkg:npm/lodash@4.17.21`.
    ///
    /// Scoped names keep their literal `@`, so `@scope/pkg` at `1.0.0`
    /// becomes `pkg:npm/@scope/pkg@1.0.0`.
    pub fn purl(&self) -> String {
        format!("pkg:npm/{}@{}", self.name, self.version)
    }
}
