//! Dependency listing parsers.
//!
//! This module is the synchronous, I/O-free core of depscan: it turns raw
//! listing text or an already-decoded lockfile tree into a deduplicated,
//! name-sorted set of [`PackageRecord`]s.
//!
//! # Supported Inputs
//!
//! | Input | Entry point |
//! |-------|-------------|
//! | `yarn list` tree output | [`parse_listing`] with [`Listing::YarnTree`] |
//! | `npm ls` output with `deduped` markers | [`parse_listing`] with [`Listing::NpmFlat`] |
//! | `package-lock.json` tree + `package.json` | [`parse_lockfile`] |
//!
//! Individual malformed lines are skipped with a diagnostic, never an error;
//! the only hard failure is naming a listing format that does not exist.
//!
//! # Example
//!
//! ```
//! use depscan::parse::{parse_listing, Listing};
//!
//! let output = "root\n├─ left-pad@1.3.0\n└─ lodash@4.17.21\n";
//! let records = parse_listing(Listing::YarnTree, output);
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].name, "left-pad");
//! ```

mod lockfile;
mod npm;
mod version;
mod yarn;

pub use lockfile::{
    flatten, parse_lockfile, reconcile, DependencyNode, DependencyTree, PackageManifest,
};
pub use version::{declared_version, is_pinned};

use crate::model::PackageRecord;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from the parsing core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The caller asked for a listing format this crate does not implement.
    #[error("unsupported listing format '{0}' (expected 'yarn' or 'npm')")]
    UnsupportedFormat(String),
}

/// Textual listing formats understood by [`parse_listing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// `yarn list` tree output.
    YarnTree,
    /// `npm ls` output with `deduped` markers.
    NpmFlat,
}

impl std::str::FromStr for Listing {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yarn" => Ok(Listing::YarnTree),
            "npm" => Ok(Listing::NpmFlat),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parses raw listing text into a normalized record set.
pub fn parse_listing(format: Listing, output: &str) -> Vec<PackageRecord> {
    let records = match format {
        Listing::YarnTree => yarn::parse(output),
        Listing::NpmFlat => npm::parse(output),
    };
    normalize(records)
}

/// Deduplicates records by purl and sorts them by name, ascending.
///
/// The first occurrence of a purl wins; later duplicates are dropped
/// silently. The sort is stable, so records sharing a name keep their
/// relative order. Running `normalize` on its own output is a no-op.
pub fn normalize(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<PackageRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.purl()))
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

/// Splits a trailing `name@version` token on its last `@`, so a leading
/// scope marker stays part of the name. Returns `None` unless both parts
/// are non-empty.
pub(crate) fn split_candidate(token: &str) -> Option<(&str, &str)> {
    let token = token.trim();
    let at = token.rfind('@')?;
    // An `@` at index 0 is a scope marker with no version separator.
    if at == 0 || at + 1 == token.len() {
        return None;
    }
    Some((&token[..at], &token[at + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyType;
    use std::str::FromStr;

    #[test]
    fn test_listing_from_str() {
        assert_eq!(Listing::from_str("yarn").unwrap(), Listing::YarnTree);
        assert_eq!(Listing::from_str("NPM").unwrap(), Listing::NpmFlat);
    }

    #[test]
    fn test_listing_from_str_unsupported() {
        let err = Listing::from_str("pnpm").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedFormat("pnpm".to_string()));
        assert!(err.to_string().contains("pnpm"));
    }

    #[test]
    fn test_split_candidate() {
        assert_eq!(split_candidate("lodash@4.17.21"), Some(("lodash", "4.17.21")));
        assert_eq!(
            split_candidate("@scope/pkg@1.0.0"),
            Some(("@scope/pkg", "1.0.0"))
        );
        assert_eq!(split_candidate(" lodash@4.17.21 "), Some(("lodash", "4.17.21")));
    }

    #[test]
    fn test_split_candidate_rejects_partial_tokens() {
        assert_eq!(split_candidate("no-version"), None);
        assert_eq!(split_candidate("@scope/pkg"), None);
        assert_eq!(split_candidate("name@"), None);
        assert_eq!(split_candidate("@1.0.0"), None);
    }

    #[test]
    fn test_normalize_dedup_keeps_first() {
        let first =
            PackageRecord::new("a", "1.0.0").with_dependency_type(DependencyType::DevDependency);
        let duplicate = PackageRecord::new("a", "1.0.0");
        let records = normalize(vec![first.clone(), duplicate]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dependency_type, DependencyType::DevDependency);
    }

    #[test]
    fn test_normalize_same_name_different_versions_survive() {
        let records = normalize(vec![
            PackageRecord::new("a", "1.0.0"),
            PackageRecord::new("a", "2.0.0"),
        ]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_normalize_sorts_by_name() {
        let records = normalize(vec![
            PackageRecord::new("zebra", "1.0.0"),
            PackageRecord::new("alpha", "1.0.0"),
            PackageRecord::new("middle", "1.0.0"),
        ]);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "middle", "zebra"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = normalize(vec![
            PackageRecord::new("b", "1.0.0"),
            PackageRecord::new("a", "1.0.0"),
            PackageRecord::new("a", "1.0.0"),
        ]);
        assert_eq!(normalize(records.clone()), records);
    }

    #[test]
    fn test_parse_listing_normalizes() {
        let output = "root\n├─ zebra@1.0.0\n├─ alpha@2.0.0\n├─ zebra@1.0.0\n";
        let records = parse_listing(Listing::YarnTree, output);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zebra"]);
    }
}
